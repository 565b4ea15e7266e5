use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

/// Pause a worker takes between finishing one item and picking the next.
///
/// The pause happens after the admission slot was released, so it spaces
/// out requests without lowering the number of concurrent transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelayPolicy {
    #[default]
    None,
    Fixed(Duration),
    /// Uniformly random pause in `min..=max`.
    Random { min: Duration, max: Duration },
}

impl DelayPolicy {
    pub fn random_millis(min: u64, max: u64) -> Self {
        DelayPolicy::Random {
            min: Duration::from_millis(min),
            max: Duration::from_millis(max),
        }
    }

    pub fn next_delay(&self) -> Duration {
        match *self {
            DelayPolicy::None => Duration::ZERO,
            DelayPolicy::Fixed(delay) => delay,
            DelayPolicy::Random { min, max } => {
                let min_ms = min.as_millis() as u64;
                let max_ms = max.as_millis() as u64;
                if max_ms <= min_ms {
                    return min;
                }
                Duration::from_millis(rand::rng().random_range(min_ms..=max_ms))
            }
        }
    }

    pub async fn pause(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }
}
