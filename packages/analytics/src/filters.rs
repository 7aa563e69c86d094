//! Row filters used by the dashboard queries.
//!
//! Both filters borrow the rows they keep; the results can be fed straight
//! back into the aggregators since `&R` is itself [`Columnar`].

use bikeshare_analytics_models::Selection;
use bikeshare_trip_models::Columnar;
use chrono::NaiveDateTime;

use crate::AnalyticsError;

/// Keeps rows whose `column` timestamp lies in `[start, end]`.
///
/// An inverted window keeps nothing.
///
/// # Errors
///
/// Returns [`AnalyticsError::Data`] if a row has no such column or it does
/// not hold a timestamp.
pub fn filter_time_window<'a, R: Columnar>(
    rows: &'a [R],
    column: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<&'a R>, AnalyticsError> {
    let mut kept = Vec::new();
    for row in rows {
        let time = row
            .cell(column)
            .and_then(|c| c.as_time())
            .ok_or_else(|| AnalyticsError::Data {
                message: format!("column '{column}' is not a timestamp column"),
            })?;
        if start <= time && time <= end {
            kept.push(row);
        }
    }
    Ok(kept)
}

/// Keeps rows whose `column` value, rendered as a label, is selected.
///
/// # Errors
///
/// Returns [`AnalyticsError::Data`] if a row has no such column.
pub fn filter_in_set<'a, R: Columnar>(
    rows: &'a [R],
    column: &str,
    selection: &Selection,
) -> Result<Vec<&'a R>, AnalyticsError> {
    let wanted = selection.to_set();
    let mut kept = Vec::new();
    for row in rows {
        let cell = row.cell(column).ok_or_else(|| AnalyticsError::Data {
            message: format!("unknown column '{column}'"),
        })?;
        if wanted.contains(cell.to_string().as_str()) {
            kept.push(row);
        }
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bikeshare_trip_models::CellValue;
    use chrono::NaiveDate;

    struct Visit {
        time: NaiveDateTime,
        year: i64,
    }

    impl Columnar for Visit {
        fn cell(&self, column: &str) -> Option<CellValue<'_>> {
            match column {
                "time" => Some(CellValue::Time(self.time)),
                "year" => Some(CellValue::Integer(self.year)),
                _ => None,
            }
        }
    }

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn visit(y: i32, m: u32, d: u32) -> Visit {
        Visit {
            time: at(y, m, d),
            year: i64::from(y),
        }
    }

    fn visits() -> Vec<Visit> {
        vec![
            visit(2022, 7, 31),
            visit(2022, 8, 1),
            visit(2022, 8, 15),
            visit(2022, 9, 1),
            visit(2023, 1, 1),
        ]
    }

    #[test]
    fn time_window_is_inclusive_at_both_ends() {
        let rows = visits();
        let kept = filter_time_window(&rows, "time", at(2022, 8, 1), at(2022, 9, 1)).unwrap();
        let times: Vec<_> = kept.iter().map(|v| v.time).collect();
        assert_eq!(times, vec![at(2022, 8, 1), at(2022, 8, 15), at(2022, 9, 1)]);
    }

    #[test]
    fn inverted_window_keeps_nothing() {
        let rows = visits();
        let kept = filter_time_window(&rows, "time", at(2022, 9, 1), at(2022, 8, 1)).unwrap();
        assert!(kept.is_empty());
    }

    #[test]
    fn non_time_column_is_a_data_error() {
        let rows = visits();
        assert!(matches!(
            filter_time_window(&rows, "year", at(2022, 1, 1), at(2023, 1, 1)),
            Err(AnalyticsError::Data { .. })
        ));
    }

    #[test]
    fn set_filter_matches_rendered_values() {
        let rows = visits();
        let one = filter_in_set(&rows, "year", &Selection::from("2023")).unwrap();
        assert_eq!(one.len(), 1);

        let both = filter_in_set(&rows, "year", &Selection::from_csv("2022,2023")).unwrap();
        assert_eq!(both.len(), rows.len());

        let none = filter_in_set(&rows, "year", &Selection::Many(Vec::new())).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn filters_compose_over_borrowed_rows() {
        let rows = visits();
        let year = filter_in_set(&rows, "year", &Selection::from("2022")).unwrap();
        let window = filter_time_window(&year, "time", at(2022, 8, 1), at(2022, 12, 31)).unwrap();
        assert_eq!(window.len(), 3);
    }
}
