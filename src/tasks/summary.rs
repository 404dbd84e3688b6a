use crate::tasks::{
    boxplot::BoxStats,
    results::{Column, ResultTable},
};
use std::{collections::BTreeMap, fmt::Write};

/// Quartile summary of one bucket of a result table.
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryRow {
    pub key: i32,
    pub runs: usize,
    pub failed: usize,
    /// Computed over the runs that finished before the timeout. `None` if
    /// every run in the bucket failed.
    pub stats: Option<BoxStats>,
}

pub fn summarize(table: &ResultTable, column: Column) -> Vec<SummaryRow> {
    let mut buckets = BTreeMap::<i32, (usize, usize, Vec<f64>)>::new();
    for row in table.iter() {
        let (runs, failed, values) = buckets.entry(row.get(column)).or_default();
        *runs += 1;
        if row.failed {
            *failed += 1;
        } else {
            values.push(row.nsec);
        }
    }

    buckets
        .into_iter()
        .map(|(key, (runs, failed, values))| SummaryRow {
            key,
            runs,
            failed,
            stats: BoxStats::new(&values),
        })
        .collect()
}

/// Render a summary as an aligned text table.
pub fn format_summary(column: Column, summary: &[SummaryRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>10} {:>6} {:>6} {:>12} {:>12} {:>12} {:>12} {:>12}",
        column.to_string(),
        "runs",
        "failed",
        "low",
        "q1",
        "median",
        "q3",
        "high"
    );

    for row in summary {
        let _ = write!(out, "{:>10} {:>6} {:>6}", row.key, row.runs, row.failed);
        match &row.stats {
            Some(s) => {
                let _ = writeln!(
                    out,
                    " {:>12.3} {:>12.3} {:>12.3} {:>12.3} {:>12.3}",
                    s.whisker_low, s.q1, s.median, s.q3, s.whisker_high
                );
            }
            None => {
                let _ = writeln!(out, " {:>12} {:>12} {:>12} {:>12} {:>12}", "-", "-", "-", "-", "-");
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_summarize() {
        let log = "1,1,1,1,1,5,0,true,false,0,1000000\n\
                   1,1,1,1,1,5,0,true,false,1,3000000\n\
                   1,1,1,1,1,5,0,true,false,2,40000000000\n\
                   1,1,1,1,1,6,0,true,false,0,31000000000\n";
        let table = ResultTable::from_reader(Cursor::new(log), "s", 1e-6).unwrap();

        let summary = summarize(&table, Column::Workers);
        assert_eq!(summary.len(), 2);

        assert_eq!(summary[0].key, 5);
        assert_eq!(summary[0].runs, 3);
        assert_eq!(summary[0].failed, 1);
        assert_eq!(summary[0].stats.unwrap().median, 2.0);

        assert_eq!(summary[1].key, 6);
        assert_eq!(summary[1].failed, 1);
        assert!(summary[1].stats.is_none());
    }

    #[test]
    fn test_format_summary() {
        let summary = vec![
            SummaryRow {
                key: 5,
                runs: 2,
                failed: 0,
                stats: BoxStats::new(&[1.0, 3.0]),
            },
            SummaryRow {
                key: 6,
                runs: 1,
                failed: 1,
                stats: None,
            },
        ];

        let text = format_summary(Column::Workers, &summary);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].trim_start().starts_with("workers"));
        assert!(lines[1].contains("2.000"));
        assert!(lines[2].ends_with('-'));
    }
}
