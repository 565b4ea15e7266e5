use std::{collections::HashMap, sync::Mutex, time::Duration};

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::engine::{DownloadReport, ItemKey, ProgressSink};

const BYTES_TEMPLATE: &str =
    "{msg:25!} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";
const COUNT_TEMPLATE: &str = "{msg:25!} [{elapsed_precise}] [{bar:40.green/white}] {pos}/{len}";
const OVERALL_TEMPLATE: &str = "{spinner:.blue} {msg} [{bar:40.green/white}] {pos}/{len}";

enum Layout {
    /// One byte-level bar per item.
    PerItem,
    /// One bar per group (album) counting finished items.
    Grouped(HashMap<ItemKey, usize>),
}

/// Terminal progress display built on `indicatif`.
///
/// Bars are created lazily when the first attempt of an item starts and
/// reused by its retries. The internal maps sit behind a mutex, so the sink
/// can be fed from all workers of a pass at once.
pub struct TerminalProgress {
    multi: MultiProgress,
    overall: ProgressBar,
    layout: Layout,
    bars: Mutex<HashMap<ItemKey, ProgressBar>>,
    group_bars: Vec<ProgressBar>,
}

impl TerminalProgress {
    /// Byte-level progress per track, used for album and track downloads.
    pub fn per_item() -> Self {
        Self::build(ProgressDrawTarget::stderr(), Layout::PerItem, Vec::new())
    }

    /// One bar per album, used for artist downloads.
    ///
    /// `groups` lists the album names with the keys of their items.
    pub fn grouped(groups: Vec<(String, Vec<ItemKey>)>) -> Self {
        Self::grouped_with_target(groups, ProgressDrawTarget::stderr())
    }

    pub fn grouped_with_target(
        groups: Vec<(String, Vec<ItemKey>)>,
        target: ProgressDrawTarget,
    ) -> Self {
        let mut membership = HashMap::new();
        let mut names = Vec::with_capacity(groups.len());
        for (index, (name, keys)) in groups.into_iter().enumerate() {
            names.push((name, keys.len() as u64));
            for key in keys {
                membership.insert(key, index);
            }
        }

        Self::build(target, Layout::Grouped(membership), names)
    }

    pub fn per_item_with_target(target: ProgressDrawTarget) -> Self {
        Self::build(target, Layout::PerItem, Vec::new())
    }

    fn build(target: ProgressDrawTarget, layout: Layout, groups: Vec<(String, u64)>) -> Self {
        let multi = MultiProgress::with_draw_target(target);

        let group_bars = groups
            .into_iter()
            .map(|(name, len)| {
                let bar = multi.add(ProgressBar::new(len));
                bar.set_style(style(COUNT_TEMPLATE));
                bar.set_message(name);
                bar
            })
            .collect();

        let overall = multi.add(ProgressBar::new(0));
        overall.set_style(style(OVERALL_TEMPLATE));
        overall.set_message("Overall");

        Self {
            multi,
            overall,
            layout,
            bars: Mutex::new(HashMap::new()),
            group_bars,
        }
    }

    fn bar(&self, key: &ItemKey) -> Option<ProgressBar> {
        self.bars.lock().ok()?.get(key).cloned()
    }

    fn group_bar(&self, key: &ItemKey) -> Option<&ProgressBar> {
        match &self.layout {
            Layout::Grouped(membership) => membership
                .get(key)
                .and_then(|index| self.group_bars.get(*index)),
            Layout::PerItem => None,
        }
    }
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
}

impl ProgressSink for TerminalProgress {
    fn batch_started(&self, total: usize) {
        self.overall.set_length(total as u64);
        self.overall.enable_steady_tick(Duration::from_millis(100));
    }

    fn pass_started(&self, pass: usize, max_passes: usize, pending: usize) {
        if pass > 1 {
            let _ = self.multi.println(format!(
                "{}",
                format!(
                    "Retrying {} failed tracks (attempt {}/{})...",
                    pending, pass, max_passes
                )
                .yellow()
            ));
        }
    }

    fn item_started(&self, key: &ItemKey, name: &str, expected_size: Option<u64>) {
        if !matches!(self.layout, Layout::PerItem) {
            return;
        }

        let Ok(mut bars) = self.bars.lock() else {
            return;
        };

        let bar = bars.entry(key.clone()).or_insert_with(|| {
            let bar = self
                .multi
                .insert_before(&self.overall, ProgressBar::new(0));
            bar.set_style(style(BYTES_TEMPLATE));
            bar
        });

        bar.reset();
        bar.set_message(name.to_string());
        bar.set_length(expected_size.unwrap_or(0));
    }

    fn item_total(&self, key: &ItemKey, total: u64) {
        if let Some(bar) = self.bar(key) {
            bar.set_length(total);
        }
    }

    fn item_progress(&self, key: &ItemKey, value: u64) {
        if let Some(bar) = self.bar(key) {
            bar.set_position(value);
        }
    }

    fn item_finished(&self, key: &ItemKey, success: bool) {
        if let Some(bar) = self.bar(key) {
            if success {
                bar.finish();
            } else {
                bar.abandon_with_message(format!("{} (failed)", bar.message()));
            }
        }

        if success {
            if let Some(group) = self.group_bar(key) {
                group.inc(1);
            }
            self.overall.inc(1);
        }
    }

    fn batch_finished(&self, report: &DownloadReport) {
        for group in &self.group_bars {
            group.finish();
        }

        if report.is_success() {
            self.overall.finish_with_message("Done");
        } else {
            self.overall
                .abandon_with_message(format!("{} failed", report.failed().len()));
        }
    }
}
