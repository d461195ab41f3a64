//! Read-only aggregation of recycling transactions for the admin dashboard.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::{EngineError, RecyclingTransaction};

/// Number of centres kept in [`Analytics::centres`].
pub const TOP_CENTRES: usize = 5;

const UNKNOWN_CENTRE: &str = "Unknown Centre";

/// Time window of an analytics query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnalyticsRange {
    #[default]
    LastWeek,
    LastMonth,
    All,
}

impl AnalyticsRange {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LastWeek => "7d",
            Self::LastMonth => "30d",
            Self::All => "all",
        }
    }

    /// Inclusive lower bound of the window, `None` for all time.
    pub fn start(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::LastWeek => Some(now - Duration::days(7)),
            Self::LastMonth => Some(now - Duration::days(30)),
            Self::All => None,
        }
    }
}

impl TryFrom<&str> for AnalyticsRange {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "7d" => Ok(Self::LastWeek),
            "30d" => Ok(Self::LastMonth),
            "all" => Ok(Self::All),
            other => Err(EngineError::InvalidInput(format!(
                "invalid range: {other} (expected 7d, 30d or all)"
            ))),
        }
    }
}

/// Volume recorded on one calendar day (UTC).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    /// Short label, e.g. `Oct 14`.
    pub name: String,
    pub volume: i64,
    pub transactions: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedValue {
    pub name: String,
    pub value: i64,
}

/// One transaction flattened for export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportRow {
    pub id: String,
    pub date: DateTime<Utc>,
    pub material: String,
    pub centre: String,
    pub quantity: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Analytics {
    pub trend: Vec<TrendPoint>,
    pub materials: Vec<NamedValue>,
    pub centres: Vec<NamedValue>,
    pub rows: Vec<ExportRow>,
}

pub(crate) fn item_label(item_names: &HashMap<i32, String>, item_id: i32) -> String {
    item_names
        .get(&item_id)
        .cloned()
        .unwrap_or_else(|| format!("Item {item_id}"))
}

fn sorted_desc(totals: HashMap<String, i64>) -> Vec<NamedValue> {
    let mut values: Vec<NamedValue> = totals
        .into_iter()
        .map(|(name, value)| NamedValue { name, value })
        .collect();
    values.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    values
}

/// Groups `transactions` by day, by material and by centre.
///
/// Volumes are sums of stored quantities. `centre_names` maps centre
/// profile ids to display names; unmapped centres are grouped under
/// `Unknown Centre`.
pub fn aggregate(
    transactions: &[RecyclingTransaction],
    item_names: &HashMap<i32, String>,
    centre_names: &HashMap<String, String>,
) -> Analytics {
    let mut ordered: Vec<&RecyclingTransaction> = transactions.iter().collect();
    ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    let mut by_day: BTreeMap<NaiveDate, (i64, u64)> = BTreeMap::new();
    let mut by_material: HashMap<String, i64> = HashMap::new();
    let mut by_centre: HashMap<String, i64> = HashMap::new();
    let mut rows = Vec::with_capacity(ordered.len());

    for tx in ordered {
        let day = by_day.entry(tx.created_at.date_naive()).or_insert((0, 0));
        day.0 += tx.quantity;
        day.1 += 1;

        let material = item_label(item_names, tx.item_id);
        *by_material.entry(material.clone()).or_insert(0) += tx.quantity;

        let centre = centre_names
            .get(&tx.collection_centre_id)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_CENTRE.to_string());
        *by_centre.entry(centre.clone()).or_insert(0) += tx.quantity;

        rows.push(ExportRow {
            id: tx.id.clone(),
            date: tx.created_at,
            material,
            centre,
            quantity: tx.quantity,
        });
    }

    let trend = by_day
        .into_iter()
        .map(|(date, (volume, transactions))| TrendPoint {
            name: date.format("%b %-d").to_string(),
            date,
            volume,
            transactions,
        })
        .collect();

    let mut centres = sorted_desc(by_centre);
    centres.truncate(TOP_CENTRES);

    Analytics {
        trend,
        materials: sorted_desc(by_material),
        centres,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn tx(
        id: &str,
        centre: &str,
        item_id: i32,
        quantity: i64,
        day: u32,
        hour: u32,
    ) -> RecyclingTransaction {
        RecyclingTransaction {
            id: id.to_string(),
            session_id: "s".to_string(),
            recycler_id: "r".to_string(),
            collection_centre_id: centre.to_string(),
            item_id,
            quantity,
            created_at: Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap(),
        }
    }

    fn items() -> HashMap<i32, String> {
        HashMap::from([
            (1, "Plastic Bottle".to_string()),
            (3, "Newspaper".to_string()),
        ])
    }

    #[test]
    fn trend_groups_by_calendar_day_in_ascending_order() {
        let txs = vec![
            tx("c", "centre", 1, 4, 14, 9),
            tx("a", "centre", 1, 2, 12, 23),
            tx("b", "centre", 3, 1500, 12, 1),
        ];
        let analytics = aggregate(&txs, &items(), &HashMap::new());

        assert_eq!(analytics.trend.len(), 2);
        assert_eq!(analytics.trend[0].name, "Oct 12");
        assert_eq!(analytics.trend[0].volume, 1502);
        assert_eq!(analytics.trend[0].transactions, 2);
        assert_eq!(analytics.trend[1].name, "Oct 14");
        assert_eq!(analytics.trend[1].volume, 4);

        let ids: Vec<&str> = analytics.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn materials_fall_back_to_item_id_label() {
        let txs = vec![tx("a", "centre", 1, 2, 12, 1), tx("b", "centre", 9, 7, 12, 2)];
        let analytics = aggregate(&txs, &items(), &HashMap::new());

        assert_eq!(
            analytics.materials,
            vec![
                NamedValue { name: "Item 9".to_string(), value: 7 },
                NamedValue { name: "Plastic Bottle".to_string(), value: 2 },
            ]
        );
    }

    #[test]
    fn centres_are_sorted_descending_and_cut_at_five() {
        let names: HashMap<String, String> = (0..7)
            .map(|i| (format!("c{i}"), format!("Centre {i}")))
            .collect();
        let txs: Vec<RecyclingTransaction> = (0..7)
            .map(|i| tx(&format!("t{i}"), &format!("c{i}"), 1, i64::from(i) + 1, 12, 1))
            .collect();

        let analytics = aggregate(&txs, &items(), &names);

        assert_eq!(analytics.centres.len(), TOP_CENTRES);
        assert_eq!(analytics.centres[0].name, "Centre 6");
        assert_eq!(analytics.centres[0].value, 7);
        assert_eq!(analytics.centres[4].name, "Centre 2");
    }

    #[test]
    fn unmapped_centres_are_grouped_as_unknown() {
        let txs = vec![tx("a", "x", 1, 2, 12, 1), tx("b", "y", 1, 3, 12, 2)];
        let analytics = aggregate(&txs, &items(), &HashMap::new());

        assert_eq!(
            analytics.centres,
            vec![NamedValue { name: "Unknown Centre".to_string(), value: 5 }]
        );
    }

    #[test]
    fn range_parsing_and_bounds() {
        let now = Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap();
        assert_eq!(
            AnalyticsRange::try_from("7d").unwrap().start(now),
            Some(now - Duration::days(7))
        );
        assert_eq!(
            AnalyticsRange::try_from("30d").unwrap().start(now),
            Some(now - Duration::days(30))
        );
        assert_eq!(AnalyticsRange::try_from("all").unwrap().start(now), None);
        assert!(AnalyticsRange::try_from("1y").is_err());
    }
}
