//! Severity filter

use crate::source::{Alert, SourceError};

/// Outcome of one pass over the alert log
#[derive(Debug, Default)]
pub struct Selection {
    /// Records read, qualifying or not
    pub scanned: usize,
    /// Qualifying alerts in log order
    pub alerts: Vec<Alert>,
}

/// Alert is newer than the watermark and at or above the threshold
pub fn is_qualifying(alert: &Alert, watermark: i64, threshold: i64) -> bool {
    alert.id > watermark && alert.level >= threshold
}

/// Collect qualifying alerts, stopping at the first unreadable record
pub fn select<I>(alerts: I, watermark: i64, threshold: i64) -> Result<Selection, SourceError>
where
    I: IntoIterator<Item = Result<Alert, SourceError>>,
{
    let mut selection = Selection::default();

    for alert in alerts {
        let alert = alert?;
        selection.scanned += 1;
        if is_qualifying(&alert, watermark, threshold) {
            selection.alerts.push(alert);
        }
    }

    Ok(selection)
}

/// Watermark after dispatching `selected`.
///
/// Only qualifying alerts move it: a new alert below the threshold leaves
/// the watermark where it is and is scanned again next cycle.
pub fn next_watermark(watermark: i64, selected: &[Alert]) -> i64 {
    selected
        .iter()
        .map(|a| a.id)
        .fold(watermark, i64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FieldError;
    use serde_json::json;

    fn alert(id: i64, level: i64) -> Alert {
        Alert {
            id,
            level,
            record: json!({ "id": id, "rule": { "level": level } }),
        }
    }

    fn sample() -> Vec<Alert> {
        vec![alert(1, 5), alert(2, 12), alert(3, 15)]
    }

    fn ids(selection: &Selection) -> Vec<i64> {
        selection.alerts.iter().map(|a| a.id).collect()
    }

    #[test]
    fn test_select_from_zero() {
        let selection = select(sample().into_iter().map(Ok), 0, 10).unwrap();
        assert_eq!(selection.scanned, 3);
        assert_eq!(ids(&selection), vec![2, 3]);
        assert_eq!(next_watermark(0, &selection.alerts), 3);
    }

    #[test]
    fn test_select_above_watermark() {
        let selection = select(sample().into_iter().map(Ok), 2, 10).unwrap();
        assert_eq!(ids(&selection), vec![3]);
    }

    #[test]
    fn test_nothing_at_or_below_watermark_is_reselected() {
        let alerts = vec![alert(4, 11), alert(9, 20), alert(10, 10), alert(15, 3), alert(22, 12)];

        for watermark in [0, 4, 9, 10, 15, 22, 100] {
            let selection = select(alerts.clone().into_iter().map(Ok), watermark, 10).unwrap();
            assert!(selection.alerts.iter().all(|a| a.id > watermark));

            let expected = alerts
                .iter()
                .filter(|a| a.id > watermark && a.level >= 10)
                .map(|a| a.id)
                .max()
                .map_or(watermark, |max| max.max(watermark));
            assert_eq!(next_watermark(watermark, &selection.alerts), expected);
        }
    }

    #[test]
    fn test_empty_selection_keeps_watermark() {
        assert_eq!(next_watermark(7, &[]), 7);
    }

    #[test]
    fn test_sub_threshold_alerts_do_not_advance() {
        let alerts = vec![alert(50, 2), alert(51, 9)];
        let selection = select(alerts.into_iter().map(Ok), 10, 10).unwrap();
        assert!(selection.alerts.is_empty());
        assert_eq!(next_watermark(10, &selection.alerts), 10);
    }

    #[test]
    fn test_duplicate_max_id() {
        let alerts = vec![alert(8, 12), alert(8, 14), alert(5, 15)];
        let selection = select(alerts.into_iter().map(Ok), 0, 10).unwrap();
        assert_eq!(ids(&selection), vec![8, 8, 5]);
        assert_eq!(next_watermark(0, &selection.alerts), 8);
    }

    #[test]
    fn test_stops_on_error() {
        let items = vec![
            Ok(alert(1, 15)),
            Err(SourceError::Field {
                path: "alerts.json".into(),
                line: 2,
                source: FieldError::NonNumericId("\"abc\"".to_string()),
            }),
            Ok(alert(3, 15)),
        ];
        assert!(select(items, 0, 10).is_err());
    }
}
