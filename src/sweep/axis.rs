//! Sweep axes and the lazy enumeration of their Cartesian product.

use std::fmt::Display;

use kstring::KString;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AxisError {
    #[error("sweep axis {0:?} has no values")]
    Empty(KString),
    #[error("sweep axis {0:?} is given more than once")]
    DuplicateName(KString),
}

/// One sweep dimension with its candidate values, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepAxis {
    pub name: KString,
    pub values: Vec<u64>,
}

impl SweepAxis {
    pub fn new(name: impl Into<KString>, values: &[u64]) -> Self {
        Self {
            name: name.into(),
            values: values.to_vec(),
        }
    }
}

/// A checked, ordered list of axes: none empty, names unique. The
/// first axis is the outermost loop, i.e. its value changes slowest.
#[derive(Debug, Clone, PartialEq)]
pub struct Axes {
    axes: Vec<SweepAxis>,
}

impl Axes {
    pub fn new(axes: Vec<SweepAxis>) -> Result<Self, AxisError> {
        for (i, axis) in axes.iter().enumerate() {
            if axis.values.is_empty() {
                return Err(AxisError::Empty(axis.name.clone()));
            }
            if axes[..i].iter().any(|a| a.name == axis.name) {
                return Err(AxisError::DuplicateName(axis.name.clone()));
            }
        }
        Ok(Self { axes })
    }

    pub fn axes(&self) -> &[SweepAxis] {
        &self.axes
    }

    /// The number of combinations, i.e. the product of the axis
    /// cardinalities (1 if there are no axes).
    pub fn total(&self) -> usize {
        self.axes.iter().map(|axis| axis.values.len()).product()
    }

    /// Restartable: each call starts from the first combination.
    pub fn combinations(&self) -> Combinations<'_> {
        Combinations {
            axes: &self.axes,
            positions: vec![0; self.axes.len()],
            done: false,
        }
    }
}

/// One element of the Cartesian product: axis name to chosen value,
/// in axis order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterCombination<'a> {
    values: Vec<(&'a KString, u64)>,
}

impl<'a> ParameterCombination<'a> {
    pub fn get(&self, name: &str) -> Option<u64> {
        self.values
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|&(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, u64)> + '_ {
        self.values.iter().map(|&(n, v)| (n.as_str(), v))
    }
}

impl<'a> Display for ParameterCombination<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (name, value) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
            first = false;
        }
        Ok(())
    }
}

/// Odometer over the axis positions, the last axis spinning fastest.
pub struct Combinations<'a> {
    axes: &'a [SweepAxis],
    positions: Vec<usize>,
    done: bool,
}

impl<'a> Iterator for Combinations<'a> {
    type Item = ParameterCombination<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let values = self
            .axes
            .iter()
            .zip(&self.positions)
            .map(|(axis, &pos)| (&axis.name, axis.values[pos]))
            .collect();

        // Advance
        self.done = true;
        for (axis, pos) in self.axes.iter().zip(self.positions.iter_mut()).rev() {
            *pos += 1;
            if *pos < axis.values.len() {
                self.done = false;
                break;
            }
            *pos = 0;
        }

        Some(ParameterCombination { values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_vecs(axes: &Axes) -> Vec<Vec<u64>> {
        axes.combinations()
            .map(|c| c.iter().map(|(_, v)| v).collect())
            .collect()
    }

    #[test]
    fn t_nesting_order() {
        let axes = Axes::new(vec![
            SweepAxis::new("height", &[1, 100]),
            SweepAxis::new("size", &[10, 20, 30]),
        ])
        .unwrap();
        assert_eq!(axes.total(), 6);
        assert_eq!(
            as_vecs(&axes),
            [
                [1, 10],
                [1, 20],
                [1, 30],
                [100, 10],
                [100, 20],
                [100, 30]
            ]
        );
        // restartable
        assert_eq!(as_vecs(&axes), as_vecs(&axes));
    }

    #[test]
    fn t_single_values() {
        let axes = Axes::new(vec![
            SweepAxis::new("height", &[100]),
            SweepAxis::new("distance", &[3]),
        ])
        .unwrap();
        let all: Vec<_> = axes.combinations().collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].get("distance"), Some(3));
        assert_eq!(all[0].get("size"), None);
        assert_eq!(all[0].to_string(), "height=100, distance=3");
    }

    #[test]
    fn t_no_axes() {
        let axes = Axes::new(vec![]).unwrap();
        assert_eq!(axes.total(), 1);
        assert_eq!(axes.combinations().count(), 1);
    }

    #[test]
    fn t_invalid() {
        assert_eq!(
            Axes::new(vec![
                SweepAxis::new("height", &[1]),
                SweepAxis::new("size", &[]),
            ]),
            Err(AxisError::Empty("size".into()))
        );
        assert_eq!(
            Axes::new(vec![
                SweepAxis::new("height", &[1]),
                SweepAxis::new("height", &[2]),
            ]),
            Err(AxisError::DuplicateName("height".into()))
        );
    }
}
