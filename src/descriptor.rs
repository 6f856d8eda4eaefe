//! Composite descriptor mini-language and the color lookup table.
//!
//! A template such as `"SD~;SG~"` is split on the placeholder character into
//! fixed text (`"SD"`, `";SG"`, `""`) interleaved with editable segments. Each
//! editable segment holds either the placeholder (untagged) or one of the
//! allowed values, e.g. `"SD++;SG--"`.

use crate::constants::MAX_DESCRIPTOR_COMBINATIONS;
use crate::error::ConfigError;
use crate::types::Color;
use std::collections::HashMap;

/// Parsed descriptor template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorTemplate {
    /// Fixed text around the editable segments; one more than the segment count
    pub non_editable: Vec<String>,
    /// Character marking an untagged segment
    pub placeholder: char,
}

impl DescriptorTemplate {
    /// Splits `template` on `placeholder`.
    pub fn parse(template: &str, placeholder: char) -> Result<Self, ConfigError> {
        let non_editable: Vec<String> = template.split(placeholder).map(str::to_string).collect();
        if non_editable.len() < 2 {
            return Err(ConfigError::NoEditableSegments(template.to_string()));
        }
        Ok(Self {
            non_editable,
            placeholder,
        })
    }

    /// Number of editable segments.
    pub fn segment_count(&self) -> usize {
        self.non_editable.len() - 1
    }

    /// Editable values of an untagged descriptor.
    pub fn untagged(&self) -> Vec<String> {
        vec![self.placeholder.to_string(); self.segment_count()]
    }

    /// Whether `value` is the placeholder.
    pub fn is_placeholder(&self, value: &str) -> bool {
        let mut chars = value.chars();
        chars.next() == Some(self.placeholder) && chars.next().is_none()
    }

    /// Interleaves the fixed text with `values`.
    pub fn render(&self, values: &[String]) -> String {
        let mut out = String::new();
        for (i, fixed) in self.non_editable.iter().enumerate() {
            out.push_str(fixed);
            if let Some(value) = values.get(i) {
                out.push_str(value);
            }
        }
        out
    }

    /// Labels of the dimensions, taken from the fixed text before each segment
    /// with surrounding punctuation stripped (`";SG"` → `"SG"`).
    pub fn labels(&self) -> Vec<String> {
        self.non_editable[..self.segment_count()]
            .iter()
            .map(|fixed| {
                fixed
                    .trim_matches(|c: char| !c.is_alphanumeric())
                    .to_string()
            })
            .collect()
    }

    /// Recovers the editable values from a rendered tag such as `"SD+;SG--"`.
    ///
    /// Values that are prefixes of each other (`"+"` and `"++"`) are resolved by
    /// requiring the rest of the tag to match.
    pub fn parse_tag(&self, tag: &str, allowed: &[String]) -> Option<Vec<String>> {
        let rest = tag.strip_prefix(self.non_editable[0].as_str())?;
        let mut candidates: Vec<String> = allowed.to_vec();
        candidates.push(self.placeholder.to_string());
        candidates.sort_by_key(|c| std::cmp::Reverse(c.len()));
        let mut values = Vec::with_capacity(self.segment_count());
        self.match_segment(rest, 0, &candidates, &mut values)
            .then_some(values)
    }

    fn match_segment(&self, rest: &str, segment: usize, candidates: &[String], values: &mut Vec<String>) -> bool {
        if segment == self.segment_count() {
            return rest.is_empty();
        }
        let fixed = &self.non_editable[segment + 1];
        for candidate in candidates {
            let Some(after) = rest
                .strip_prefix(candidate.as_str())
                .and_then(|after| after.strip_prefix(fixed.as_str()))
            else {
                continue;
            };
            values.push(candidate.clone());
            if self.match_segment(after, segment + 1, candidates, values) {
                return true;
            }
            values.pop();
        }
        false
    }
}

/// Composite key of a set of editable values, e.g. `"0+1--"`.
///
/// Untagged segments contribute nothing, so a fully untagged descriptor maps
/// to the empty key.
pub fn color_key(values: &[String], template: &DescriptorTemplate) -> String {
    values
        .iter()
        .enumerate()
        .filter(|(_, value)| !template.is_placeholder(value))
        .map(|(i, value)| format!("{i}{value}"))
        .collect()
}

/// Lookup from composite key to color.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorTable {
    colors: HashMap<String, Color>,
    default: Color,
}

/// Number of distinct tags `values` values over `segments` segments can form.
///
/// Fails when that exceeds [`MAX_DESCRIPTOR_COMBINATIONS`].
pub fn combination_count(values: usize, segments: usize) -> Result<usize, ConfigError> {
    u32::try_from(segments)
        .ok()
        .and_then(|exp| values.checked_pow(exp))
        .filter(|count| *count <= MAX_DESCRIPTOR_COMBINATIONS)
        .ok_or(ConfigError::TooManyCombinations {
            values,
            segments,
            limit: MAX_DESCRIPTOR_COMBINATIONS,
        })
}

impl ColorTable {
    /// Builds the table from a flat list: the default color, then one color per
    /// value combination with segment 0 varying slowest.
    pub fn new(palette: &[Color], values: &[String], segments: usize) -> Result<Self, ConfigError> {
        let combinations = combination_count(values.len(), segments)?;
        let expected = combinations + 1;
        if palette.len() != expected {
            return Err(ConfigError::PaletteLength {
                expected,
                actual: palette.len(),
                values: values.len(),
                segments,
            });
        }

        let mut colors = HashMap::with_capacity(expected);
        colors.insert(String::new(), palette[0]);
        for combination in 0..combinations {
            let key: String = (0..segments)
                .map(|segment| {
                    let stride = values.len().pow((segments - 1 - segment) as u32);
                    format!("{segment}{}", values[(combination / stride) % values.len()])
                })
                .collect();
            colors.insert(key, palette[combination + 1]);
        }
        Ok(Self {
            colors,
            default: palette[0],
        })
    }

    /// Color for `key`, falling back to the default color.
    pub fn lookup(&self, key: &str) -> Color {
        self.colors.get(key).copied().unwrap_or(self.default)
    }

    /// The color of untagged clauses.
    pub fn default_color(&self) -> Color {
        self.default
    }
}

/// Validated descriptor configuration shared by the overlays and the codec.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorConfig {
    /// Parsed template
    pub template: DescriptorTemplate,
    /// Values an editable segment may take, in display order
    pub allowed_values: Vec<String>,
    /// Dimension labels, one per editable segment
    pub labels: Vec<String>,
    /// Color lookup table
    pub colors: ColorTable,
}

impl DescriptorConfig {
    /// Validates and assembles a descriptor configuration.
    ///
    /// Empty `labels` are derived from the template.
    pub fn new(
        template: &str,
        placeholder: char,
        allowed_values: Vec<String>,
        palette: &[Color],
        labels: Vec<String>,
    ) -> Result<Self, ConfigError> {
        let template = DescriptorTemplate::parse(template, placeholder)?;
        if allowed_values.is_empty() {
            return Err(ConfigError::EmptyValues);
        }
        for (i, value) in allowed_values.iter().enumerate() {
            if value.is_empty() || value.contains(placeholder) {
                return Err(ConfigError::InvalidValue(value.clone()));
            }
            if allowed_values[..i].contains(value) {
                return Err(ConfigError::DuplicateValue(value.clone()));
            }
        }
        let segments = template.segment_count();
        let labels = if labels.is_empty() { template.labels() } else { labels };
        if labels.len() != segments {
            return Err(ConfigError::LabelCount {
                expected: segments,
                actual: labels.len(),
            });
        }
        let colors = ColorTable::new(palette, &allowed_values, segments)?;
        Ok(Self {
            template,
            allowed_values,
            labels,
            colors,
        })
    }

    /// Whether `value` may be written into an editable segment.
    pub fn accepts(&self, value: &str) -> bool {
        self.template.is_placeholder(value) || self.allowed_values.iter().any(|v| v == value)
    }

    /// Color for a set of editable values.
    pub fn color_for(&self, values: &[String]) -> Color {
        self.colors.lookup(&color_key(values, &self.template))
    }
}
