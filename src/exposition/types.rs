use std::collections::BTreeMap;

/// Label that splits a summary sample into one quantile level.
pub const QUANTILE_LABEL: &str = "quantile";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Gauge,
    Summary,
    Unknown,
}

impl MetricType {
    /// Maps the type token of a `# TYPE` line. Histograms and untyped
    /// families are reported as `Unknown` and carry plain values.
    #[must_use]
    pub fn from_type_token(token: &str) -> Self {
        match token {
            "counter" => MetricType::Counter,
            "gauge" => MetricType::Gauge,
            "summary" => MetricType::Summary,
            _ => MetricType::Unknown,
        }
    }
}

/// One label set within a family.
///
/// Summary instances carry `quantiles` (plus optional `sum`/`count`); all
/// other instances carry `value`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricInstance {
    pub labels: BTreeMap<String, String>,
    pub value: Option<f64>,
    pub quantiles: Option<BTreeMap<String, f64>>,
    pub sum: Option<f64>,
    pub count: Option<f64>,
}

impl MetricInstance {
    #[must_use]
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// Looks up a quantile by its exact level string, e.g. `"0.95"`.
    #[must_use]
    pub fn quantile(&self, level: &str) -> Option<f64> {
        self.quantiles.as_ref()?.get(level).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub help: Option<String>,
    pub metric_type: MetricType,
    pub instances: Vec<MetricInstance>,
}

impl MetricFamily {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            help: None,
            metric_type: MetricType::Unknown,
            instances: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    #[must_use]
    pub fn instance_with_labels(
        &self,
        labels: &BTreeMap<String, String>,
    ) -> Option<&MetricInstance> {
        self.instances
            .iter()
            .find(|instance| &instance.labels == labels)
    }

    /// Applies `update` to the instance for `labels`, appending a new
    /// instance on first sight so family order stays first-seen.
    pub(super) fn update_instance<F>(&mut self, labels: BTreeMap<String, String>, update: F)
    where
        F: FnOnce(&mut MetricInstance),
    {
        match self
            .instances
            .iter_mut()
            .find(|instance| instance.labels == labels)
        {
            Some(instance) => update(instance),
            None => {
                let mut instance = MetricInstance {
                    labels,
                    ..MetricInstance::default()
                };
                update(&mut instance);
                self.instances.push(instance);
            }
        }
    }
}
