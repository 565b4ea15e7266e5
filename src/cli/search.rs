use tabled::Table;

use crate::{dab::catalog, error, types::SearchKind, utils, warning};

pub async fn search(query: &str, kind: SearchKind) {
    let client = super::session_client().await;

    let results = match catalog::search(&client, query, kind).await {
        Ok(results) => results,
        Err(e) if e.is_not_found() => {
            warning!("No {}s found for '{}'", kind, query);
            return;
        }
        Err(e) => error!("Search failed. Err: {}", e),
    };

    let rows = utils::search_rows(&results, kind);
    if rows.is_empty() {
        warning!("No {}s found for '{}'", kind, query);
        return;
    }

    println!("{}", Table::new(rows));
}
