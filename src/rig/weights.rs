//! Weighted label lists and the allocator that hands labels out to targets.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::{RigError, RigResult};

/// A label and its share of the targets, in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedLabel {
    pub value: String,
    pub weight: f64,
}

impl WeightedLabel {
    /// Builds an entry, clamping the weight into `[0, 1]`. Non-finite weights
    /// are rejected.
    pub fn new(value: impl Into<String>, weight: f64) -> RigResult<Self> {
        Ok(Self {
            value: value.into(),
            weight: clamp_weight(weight)?,
        })
    }
}

impl Default for WeightedLabel {
    fn default() -> Self {
        Self {
            value: "Empty".to_owned(),
            weight: 1.0,
        }
    }
}

fn clamp_weight(weight: f64) -> RigResult<f64> {
    if !weight.is_finite() {
        return Err(RigError::invalid(format!(
            "weight must be a finite number, got {weight}"
        )));
    }
    Ok(weight.clamp(0.0, 1.0))
}

/// Ordered, editable list of weighted labels.
///
/// Serializes as a plain array. Deserializing goes through [`WeightedLabel::new`],
/// so a list read from a host obeys the same rules as one built by hand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<WeightedLabel>", try_from = "Vec<WeightedLabel>")]
pub struct WeightList {
    items: Vec<WeightedLabel>,
}

impl TryFrom<Vec<WeightedLabel>> for WeightList {
    type Error = RigError;

    fn try_from(items: Vec<WeightedLabel>) -> RigResult<Self> {
        Self::from_pairs(items.into_iter().map(|item| (item.value, item.weight)))
    }
}

impl From<WeightList> for Vec<WeightedLabel> {
    fn from(list: WeightList) -> Self {
        list.items
    }
}

impl WeightList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from `(value, weight)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> RigResult<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let items = pairs
            .into_iter()
            .map(|(value, weight)| WeightedLabel::new(value, weight))
            .collect::<RigResult<Vec<_>>>()?;
        Ok(Self { items })
    }

    #[must_use]
    pub fn items(&self) -> &[WeightedLabel] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.items.iter().map(|item| item.weight).sum()
    }

    /// Appends an entry and returns its index.
    pub fn push(&mut self, value: impl Into<String>, weight: f64) -> RigResult<usize> {
        self.items.push(WeightedLabel::new(value, weight)?);
        Ok(self.items.len() - 1)
    }

    /// Appends the default `("Empty", 1.0)` entry and returns its index.
    pub fn push_default(&mut self) -> usize {
        self.items.push(WeightedLabel::default());
        self.items.len() - 1
    }

    pub fn set_weight(&mut self, index: usize, weight: f64) -> RigResult<()> {
        let weight = clamp_weight(weight)?;
        let item = self.item_mut(index)?;
        item.weight = weight;
        Ok(())
    }

    pub fn set_value(&mut self, index: usize, value: impl Into<String>) -> RigResult<()> {
        self.item_mut(index)?.value = value.into();
        Ok(())
    }

    /// Removes the entry at `index` and returns the index that should become
    /// active: the previous entry, or `0`.
    pub fn remove(&mut self, index: usize) -> RigResult<usize> {
        self.item_mut(index)?;
        self.items.remove(index);
        Ok(index.saturating_sub(1).min(self.items.len().saturating_sub(1)))
    }

    /// Swaps the entry with its predecessor; returns its new index.
    pub fn move_up(&mut self, index: usize) -> RigResult<usize> {
        self.item_mut(index)?;
        if index == 0 {
            return Ok(0);
        }
        self.items.swap(index, index - 1);
        Ok(index - 1)
    }

    /// Swaps the entry with its successor; returns its new index.
    pub fn move_down(&mut self, index: usize) -> RigResult<usize> {
        self.item_mut(index)?;
        if index + 1 >= self.items.len() {
            return Ok(index);
        }
        self.items.swap(index, index + 1);
        Ok(index + 1)
    }

    fn item_mut(&mut self, index: usize) -> RigResult<&mut WeightedLabel> {
        let len = self.items.len();
        self.items.get_mut(index).ok_or_else(|| {
            RigError::invalid(format!("weight list index {index} out of range (len {len})"))
        })
    }
}

/// Labels handed out by [`allocate`], aligned with the targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub labels: Vec<Option<String>>,
    /// Weight consumed per target.
    pub step_size: f64,
}

impl Allocation {
    /// How many targets received `value`.
    #[must_use]
    pub fn count_of(&self, value: &str) -> usize {
        self.labels
            .iter()
            .filter(|label| label.as_deref() == Some(value))
            .count()
    }
}

/// Hands one label to each of `target_count` targets.
///
/// `step_size = total weight / target_count`. Every target gets a label
/// picked uniformly from the labels still in the pool, regardless of how much
/// weight each has left; the picked label's weight then drops by `step_size`
/// and the label leaves the pool once its weight reaches zero. A label can
/// therefore run dry early when it happens to be drawn often.
pub fn allocate<R: Rng + ?Sized>(
    target_count: usize,
    weights: &WeightList,
    rng: &mut R,
) -> RigResult<Allocation> {
    if weights.is_empty() {
        return Err(RigError::invalid("weight list is empty"));
    }
    if target_count == 0 {
        return Ok(Allocation::default());
    }

    let step_size = weights.total() / target_count as f64;
    let mut pool: Vec<(String, f64)> = weights
        .items()
        .iter()
        .map(|item| (item.value.clone(), item.weight))
        .collect();
    let mut labels = Vec::with_capacity(target_count);

    for target in 0..target_count {
        if pool.is_empty() {
            log::warn!(
                "weight list exhausted after {target} of {target_count} targets; the rest stay unassigned"
            );
            labels.resize(target_count, None);
            break;
        }
        let index = rng.random_range(0..pool.len());
        let entry = &mut pool[index];
        entry.1 -= step_size;
        labels.push(Some(entry.0.clone()));
        if entry.1 <= 0.0 {
            pool.remove(index);
        }
    }

    Ok(Allocation { labels, step_size })
}

#[cfg(test)]
mod tests {
    use super::{WeightList, WeightedLabel};
    use crate::rig::RigError;

    #[test]
    fn weights_are_clamped_to_unit_range() {
        let mut list = WeightList::new();
        list.push("a", 1.5).expect("push");
        list.push("b", -0.2).expect("push");
        assert_eq!(list.items()[0].weight, 1.0);
        assert_eq!(list.items()[1].weight, 0.0);
        assert!(list.push("c", f64::NAN).is_err());
    }

    #[test]
    fn infinite_weights_are_rejected() {
        let mut list = WeightList::new();
        assert!(matches!(
            list.push("a", f64::INFINITY),
            Err(RigError::InvalidInput { .. })
        ));
        assert!(list.push("b", f64::NEG_INFINITY).is_err());
        assert!(list.is_empty());

        let index = list.push_default();
        assert!(list.set_weight(index, f64::INFINITY).is_err());
        assert_eq!(list.items()[index].weight, 1.0);
    }

    #[test]
    fn list_from_raw_entries_is_validated() {
        let raw = vec![
            WeightedLabel {
                value: "a".to_owned(),
                weight: 3.0,
            },
            WeightedLabel {
                value: "b".to_owned(),
                weight: -1.0,
            },
        ];
        let list = WeightList::try_from(raw).expect("list");
        assert_eq!(list.items()[0].weight, 1.0);
        assert_eq!(list.items()[1].weight, 0.0);

        let raw = vec![WeightedLabel {
            value: "a".to_owned(),
            weight: f64::INFINITY,
        }];
        assert!(WeightList::try_from(raw).is_err());
    }

    #[test]
    fn json_lists_are_clamped_on_read() {
        let list: WeightList =
            serde_json::from_str(r#"[{"value": "HP_gun", "weight": 2.5}, {"value": "P_a", "weight": 0.5}]"#)
                .expect("json");
        assert_eq!(list.total(), 1.5);

        let json = serde_json::to_string(&list).expect("json");
        assert_eq!(
            json,
            r#"[{"value":"HP_gun","weight":1.0},{"value":"P_a","weight":0.5}]"#
        );
    }

    #[test]
    fn default_entry_matches_list_editor() {
        let mut list = WeightList::new();
        let index = list.push_default();
        assert_eq!(index, 0);
        assert_eq!(list.items()[0], WeightedLabel::default());
        assert_eq!(list.items()[0].value, "Empty");
    }

    #[test]
    fn remove_moves_active_index_back() {
        let mut list = WeightList::from_pairs([("a", 1.0), ("b", 1.0), ("c", 1.0)]).expect("list");
        assert_eq!(list.remove(2).expect("remove"), 1);
        assert_eq!(list.remove(0).expect("remove"), 0);
        assert_eq!(list.remove(0).expect("remove"), 0);
        assert!(list.is_empty());
        assert!(list.remove(0).is_err());
    }

    #[test]
    fn move_up_and_down_stop_at_edges() {
        let mut list = WeightList::from_pairs([("a", 0.1), ("b", 0.2)]).expect("list");
        assert_eq!(list.move_up(0).expect("move"), 0);
        assert_eq!(list.move_down(0).expect("move"), 1);
        assert_eq!(list.items()[1].value, "a");
        assert_eq!(list.move_down(1).expect("move"), 1);
        assert_eq!(list.move_up(1).expect("move"), 0);
        assert_eq!(list.items()[0].value, "a");
    }
}
