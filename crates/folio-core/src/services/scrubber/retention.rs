//! Retention policies applied to orphan candidates.

use chrono::NaiveDate;

use crate::domain::ResourceInfo;

/// Split `items` into (kept, deleted): the `keep` most recent by date are kept.
///
/// Ties keep the earlier position in `items`.
pub fn keep_most_recent<T, F>(mut items: Vec<T>, keep: usize, date_of: F) -> (Vec<T>, Vec<T>)
where
    F: Fn(&T) -> NaiveDate,
{
    items.sort_by_key(|item| std::cmp::Reverse(date_of(item)));
    let deleted = if items.len() > keep {
        items.split_off(keep)
    } else {
        Vec::new()
    };
    (items, deleted)
}

/// Resource bundles that may be deleted.
///
/// Every version at or above the newest downloaded bundle is kept. With no
/// downloaded bundle at all nothing is deleted.
pub fn outdated_resource_infos(infos: Vec<ResourceInfo>) -> Vec<ResourceInfo> {
    let Some(baseline) = infos
        .iter()
        .filter(|info| info.is_downloaded())
        .map(|info| info.version)
        .max()
    else {
        return Vec::new();
    };

    infos
        .into_iter()
        .filter(|info| info.version < baseline)
        .collect()
}
