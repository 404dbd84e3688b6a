use crate::tasks::results::{Column, ResultTable};
use log::warn;
use std::collections::{BTreeMap, BTreeSet};

/// Elapsed times of a table bucketed by one independent variable. Keys are
/// kept in ascending order, and `series[i]` belongs to `keys[i]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SeriesGroup {
    pub keys: Vec<i32>,
    pub series: Vec<Vec<f64>>,
}

impl SeriesGroup {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, key: i32) -> Option<&Vec<f64>> {
        self.keys
            .binary_search(&key)
            .ok()
            .map(|idx| &self.series[idx])
    }
}

/// Bucket the (rescaled) elapsed times of `table` by `column`.
pub fn group_by(table: &ResultTable, column: Column) -> SeriesGroup {
    let mut buckets = BTreeMap::<i32, Vec<f64>>::new();
    for row in table.iter() {
        buckets.entry(row.get(column)).or_default().push(row.nsec);
    }

    let (keys, series) = buckets.into_iter().unzip();
    SeriesGroup { keys, series }
}

/// Work out a common set of x-ticks for `groups` and line every group up
/// against it, inserting an empty series where a group has no bucket.
///
/// The ticks are the sorted union of all keys. When the groups' keys are
/// prefixes of the widest one, as the experiment sweeps produce, that is just
/// the widest group's keys. Anything else gets a warning, since boxes of
/// different groups then sit over ticks that only some of them measured.
pub fn align_groups(groups: &[SeriesGroup]) -> (Vec<i32>, Vec<Vec<Vec<f64>>>) {
    let ticks: Vec<i32> = groups
        .iter()
        .flat_map(|group| group.keys.iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    for (idx, group) in groups.iter().enumerate() {
        if group.keys[..] != ticks[..group.len()] {
            warn!(
                "x-tick keys of group {idx} are not a prefix of the widest group (keys={:?}, ticks={ticks:?})",
                group.keys
            );
        }
    }

    let datasets = groups
        .iter()
        .map(|group| {
            ticks
                .iter()
                .map(|tick| group.get(*tick).cloned().unwrap_or_default())
                .collect()
        })
        .collect();

    (ticks, datasets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn table(log: &str) -> ResultTable {
        ResultTable::from_reader(Cursor::new(log), "test", 1.0).unwrap()
    }

    #[test]
    fn test_group_by_sorts_keys() {
        let table = table(
            "1,1,1,1,1,7,0,true,false,0,70\n\
             1,1,1,1,1,5,0,true,false,0,50\n\
             1,1,1,1,1,7,0,true,false,1,71\n\
             1,1,1,1,1,6,0,true,false,0,60\n",
        );

        let group = group_by(&table, Column::Workers);
        assert_eq!(group.keys, vec![5, 6, 7]);
        assert_eq!(group.series, vec![vec![50.0], vec![60.0], vec![70.0, 71.0]]);
        assert_eq!(group.get(7), Some(&vec![70.0, 71.0]));
        assert_eq!(group.get(8), None);
    }

    #[test]
    fn test_group_by_is_deterministic() {
        let table = table(
            "2,1,1,1,1,9,3,true,false,0,1\n\
             1,1,1,1,1,5,1,true,false,0,2\n\
             2,1,1,1,1,5,2,true,false,1,3\n",
        );

        for column in [Column::Projects, Column::Workers, Column::Hungry] {
            assert_eq!(group_by(&table, column), group_by(&table, column));
        }
    }

    #[test]
    fn test_group_by_empty_table() {
        let group = group_by(&table(""), Column::Workers);
        assert!(group.is_empty());
    }

    #[test]
    fn test_align_prefix_groups() {
        let wide = SeriesGroup {
            keys: vec![1, 2, 3],
            series: vec![vec![1.0], vec![2.0], vec![3.0]],
        };
        let short = SeriesGroup {
            keys: vec![1, 2],
            series: vec![vec![10.0], vec![20.0]],
        };

        let (ticks, datasets) = align_groups(&[short, wide]);
        assert_eq!(ticks, vec![1, 2, 3]);
        assert_eq!(datasets[0], vec![vec![10.0], vec![20.0], vec![]]);
        assert_eq!(datasets[1], vec![vec![1.0], vec![2.0], vec![3.0]]);
    }

    #[test]
    fn test_align_divergent_groups() {
        let low = SeriesGroup {
            keys: vec![1, 2],
            series: vec![vec![1.0], vec![2.0]],
        };
        let high = SeriesGroup {
            keys: vec![3, 4],
            series: vec![vec![3.0], vec![4.0]],
        };

        let (ticks, datasets) = align_groups(&[low, high]);
        assert_eq!(ticks, vec![1, 2, 3, 4]);
        assert_eq!(datasets[0], vec![vec![1.0], vec![2.0], vec![], vec![]]);
        assert_eq!(datasets[1], vec![vec![], vec![], vec![3.0], vec![4.0]]);
    }
}
