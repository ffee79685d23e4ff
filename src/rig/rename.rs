//! Sequential renaming from a name template.
//!
//! The template understands two placeholders: `%s` for the current name and
//! `%i` for the running number.

use serde::{Deserialize, Serialize};

use super::error::{RigError, RigResult};

const NAME_PLACEHOLDER: &str = "%s";
const NUMBER_PLACEHOLDER: &str = "%i";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameOptions {
    pub start: u64,
    pub step: u64,
    /// Left-pad numbers with zeros.
    pub pad: bool,
    /// Pad width; `0` derives it from the largest number in the run.
    pub pad_width: usize,
    pub template: String,
}

impl Default for RenameOptions {
    fn default() -> Self {
        Self {
            start: 0,
            step: 1,
            pad: true,
            pad_width: 0,
            template: format!("{NAME_PLACEHOLDER}_{NUMBER_PLACEHOLDER}"),
        }
    }
}

impl RenameOptions {
    /// Number of the item at `index`; fails when it does not fit in a `u64`.
    pub fn number_at(&self, index: usize) -> RigResult<u64> {
        u64::try_from(index)
            .ok()
            .and_then(|index| index.checked_mul(self.step))
            .and_then(|offset| self.start.checked_add(offset))
            .ok_or_else(|| {
                RigError::invalid(format!(
                    "rename number for item {index} overflows (start {}, step {})",
                    self.start, self.step
                ))
            })
    }

    /// Width numbers are padded to for a run of `count` items.
    pub fn effective_width(&self, count: usize) -> RigResult<usize> {
        // Numbers grow with the index, so the last one bounds the whole run.
        let largest = self.number_at(count.saturating_sub(1))?;
        if self.pad_width > 0 {
            return Ok(self.pad_width);
        }
        Ok(digit_count(largest))
    }
}

fn digit_count(value: u64) -> usize {
    value.checked_ilog10().map_or(1, |log| log as usize + 1)
}

/// Names for every item of a run, in order.
pub fn rename<S: AsRef<str>>(names: &[S], options: &RenameOptions) -> RigResult<Vec<String>> {
    let width = options.effective_width(names.len())?;
    names
        .iter()
        .enumerate()
        .map(|(index, name)| format_name(name.as_ref(), index, width, options))
        .collect()
}

/// The name the first of `count` items would receive.
pub fn preview(first_name: &str, options: &RenameOptions, count: usize) -> RigResult<String> {
    let width = options.effective_width(count.max(1))?;
    format_name(first_name, 0, width, options)
}

fn format_name(
    name: &str,
    index: usize,
    width: usize,
    options: &RenameOptions,
) -> RigResult<String> {
    let number = options.number_at(index)?;
    let number = if options.pad {
        format!("{number:0width$}")
    } else {
        number.to_string()
    };
    Ok(expand_template(&options.template, name, &number))
}

/// Single left-to-right pass, so placeholders inside the substituted name are
/// left alone.
fn expand_template(template: &str, name: &str, number: &str) -> String {
    let mut out = String::with_capacity(template.len() + name.len() + number.len());
    let mut rest = template;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with(NAME_PLACEHOLDER) {
            out.push_str(name);
            rest = &tail[NAME_PLACEHOLDER.len()..];
        } else if tail.starts_with(NUMBER_PLACEHOLDER) {
            out.push_str(number);
            rest = &tail[NUMBER_PLACEHOLDER.len()..];
        } else {
            out.push('%');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
