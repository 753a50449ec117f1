use std::collections::{BTreeMap, HashMap};

use super::types::{MetricFamily, MetricType, QUANTILE_LABEL};

const SUM_SUFFIX: &str = "_sum";
const COUNT_SUFFIX: &str = "_count";

/// Parses a raw scrape body. Non UTF-8 input yields no families.
#[must_use]
pub fn parse_bytes(bytes: &[u8]) -> Vec<MetricFamily> {
    std::str::from_utf8(bytes).map_or_else(|_| Vec::new(), parse)
}

/// Parses exposition text into families in first-seen order.
///
/// Malformed lines are dropped one at a time; the parse itself never fails.
#[must_use]
pub fn parse(text: &str) -> Vec<MetricFamily> {
    let mut builder = FamilyBuilder::default();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            builder.apply_comment(comment);
            continue;
        }
        if let Some(sample) = parse_sample(line) {
            builder.push_sample(sample);
        }
    }
    builder.families
}

#[derive(Debug, PartialEq)]
struct Sample {
    name: String,
    labels: BTreeMap<String, String>,
    value: f64,
}

#[derive(Clone, Copy)]
enum SummaryPart {
    Sum,
    Count,
}

#[derive(Default)]
struct FamilyBuilder {
    families: Vec<MetricFamily>,
    positions: HashMap<String, usize>,
}

impl FamilyBuilder {
    fn position(&mut self, name: &str) -> usize {
        if let Some(position) = self.positions.get(name) {
            return *position;
        }
        let position = self.families.len();
        self.families.push(MetricFamily::new(name));
        self.positions.insert(name.to_owned(), position);
        position
    }

    fn family_mut(&mut self, name: &str) -> Option<&mut MetricFamily> {
        let position = self.position(name);
        self.families.get_mut(position)
    }

    fn apply_comment(&mut self, comment: &str) {
        let comment = comment.trim_start();
        let Some((keyword, rest)) = comment.split_once(char::is_whitespace) else {
            return;
        };
        let rest = rest.trim_start();
        let (name, tail) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        if !is_metric_name(name) {
            return;
        }
        match keyword {
            "TYPE" => {
                let metric_type = MetricType::from_type_token(tail.trim());
                if let Some(family) = self.family_mut(name) {
                    family.metric_type = metric_type;
                }
            }
            "HELP" => {
                let help = unescape_help(tail.trim());
                if let Some(family) = self.family_mut(name) {
                    family.help = Some(help);
                }
            }
            _ => {}
        }
    }

    fn summary_base(&self, name: &str) -> Option<(usize, SummaryPart)> {
        let (base, part) = if let Some(base) = name.strip_suffix(SUM_SUFFIX) {
            (base, SummaryPart::Sum)
        } else if let Some(base) = name.strip_suffix(COUNT_SUFFIX) {
            (base, SummaryPart::Count)
        } else {
            return None;
        };
        let position = *self.positions.get(base)?;
        let family = self.families.get(position)?;
        let carries_quantiles = family.metric_type == MetricType::Summary
            || (family.metric_type == MetricType::Unknown
                && family
                    .instances
                    .iter()
                    .any(|instance| instance.quantiles.is_some()));
        carries_quantiles.then_some((position, part))
    }

    fn push_sample(&mut self, sample: Sample) {
        let Sample {
            name,
            mut labels,
            value,
        } = sample;

        if !self.positions.contains_key(&name) {
            if let Some((position, part)) = self.summary_base(&name) {
                if let Some(family) = self.families.get_mut(position) {
                    family.update_instance(labels, |instance| {
                        instance.quantiles.get_or_insert_with(BTreeMap::new);
                        match part {
                            SummaryPart::Sum => instance.sum = Some(value),
                            SummaryPart::Count => instance.count = Some(value),
                        }
                    });
                }
                return;
            }
        }

        let Some(family) = self.family_mut(&name) else {
            return;
        };
        // Untyped families with quantile levels are read as summaries.
        let untyped_quantile =
            family.metric_type == MetricType::Unknown && labels.contains_key(QUANTILE_LABEL);
        if family.metric_type == MetricType::Summary || untyped_quantile {
            // Summary samples without a quantile level carry nothing usable.
            let Some(level) = labels.remove(QUANTILE_LABEL) else {
                return;
            };
            family.update_instance(labels, |instance| {
                instance
                    .quantiles
                    .get_or_insert_with(BTreeMap::new)
                    .insert(level, value);
            });
        } else {
            family.update_instance(labels, |instance| instance.value = Some(value));
        }
    }
}

fn parse_sample(line: &str) -> Option<Sample> {
    let name_end = line.find(|ch: char| ch == '{' || ch.is_whitespace())?;
    let (name, rest) = line.split_at(name_end);
    if !is_metric_name(name) {
        return None;
    }

    let (labels, rest) = match rest.strip_prefix('{') {
        Some(body) => parse_labels(body)?,
        None => (BTreeMap::new(), rest),
    };

    let mut tokens = rest.split_whitespace();
    let value = parse_value(tokens.next()?)?;
    if let Some(timestamp) = tokens.next() {
        timestamp.parse::<i64>().ok()?;
    }
    if tokens.next().is_some() {
        return None;
    }

    Some(Sample {
        name: name.to_owned(),
        labels,
        value,
    })
}

fn parse_labels(input: &str) -> Option<(BTreeMap<String, String>, &str)> {
    let mut labels = BTreeMap::new();
    let mut rest = input.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix('}') {
            return Some((labels, after));
        }
        let (key, after_key) = rest.split_once('=')?;
        let key = key.trim();
        if !is_label_name(key) {
            return None;
        }
        let quoted = after_key.trim_start().strip_prefix('"')?;
        let (value, after_value) = read_quoted(quoted)?;
        labels.insert(key.to_owned(), value);

        rest = after_value.trim_start();
        if let Some(after_comma) = rest.strip_prefix(',') {
            rest = after_comma.trim_start();
        } else if !rest.starts_with('}') {
            return None;
        }
    }
}

fn read_quoted(input: &str) -> Option<(String, &str)> {
    let mut value = String::new();
    let mut chars = input.char_indices();
    while let Some((index, ch)) = chars.next() {
        match ch {
            '"' => {
                let rest = input.get(index.saturating_add(ch.len_utf8())..)?;
                return Some((value, rest));
            }
            '\\' => {
                let (_, escaped) = chars.next()?;
                match escaped {
                    'n' => value.push('\n'),
                    other => value.push(other),
                }
            }
            other => value.push(other),
        }
    }
    None
}

fn parse_value(token: &str) -> Option<f64> {
    match token {
        "+Inf" | "Inf" => Some(f64::INFINITY),
        "-Inf" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        other => other.parse::<f64>().ok(),
    }
}

fn unescape_help(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn is_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_' || first == ':')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == ':')
}

fn is_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}
