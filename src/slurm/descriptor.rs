/// A GPU GRES descriptor as printed by Slurm, e.g. `gpu:4` or `gpu:tesla:4(IDX:0-3)`.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuDescriptor {
    /// `4` or `gpu:4`
    Count(f64),
    /// `gpu:tesla:4`, the index suffix (if any) already dropped
    ModelCount { model: String, count: f64 },
    /// Anything else, including Slurm's `(null)` for nodes without GRES
    Unparsable,
}

const GPU_PREFIX: &str = "gpu:";

impl GpuDescriptor {
    pub fn parse(text: &str) -> Self {
        let text = text.strip_prefix(GPU_PREFIX).unwrap_or(text);
        // drop the index range suffix: "tesla:4(IDX:0-3)" -> "tesla:4"
        let text = match text.find('(') {
            Some(pos) => &text[..pos],
            None => text,
        };

        let parts: Vec<&str> = text.split(':').collect();
        if let [model, count] = parts.as_slice() {
            return match count.parse::<f64>() {
                Ok(count) => GpuDescriptor::ModelCount {
                    model: model.to_string(),
                    count,
                },
                Err(_) => GpuDescriptor::Unparsable,
            };
        }

        match text.parse::<f64>() {
            Ok(count) => GpuDescriptor::Count(count),
            Err(_) => GpuDescriptor::Unparsable,
        }
    }

    pub fn gpu_count(&self) -> f64 {
        match self {
            GpuDescriptor::Count(count) => *count,
            GpuDescriptor::ModelCount { count, .. } => *count,
            GpuDescriptor::Unparsable => 0.0,
        }
    }
}

/// Number of GPUs in a descriptor, `0` when it can't be parsed.
pub fn parse_gpu_descriptor(text: &str) -> f64 {
    GpuDescriptor::parse(text).gpu_count()
}

/// Strip the `gpu:` prefix from an `AllocGRES` value and parse the rest as a plain number.
///
/// Unlike [`parse_gpu_descriptor`] this does not understand model names,
/// `gpu:tesla:2` yields `0`.
pub fn parse_allocated_gres(text: &str) -> f64 {
    text.strip_prefix(GPU_PREFIX)
        .unwrap_or(text)
        .parse::<f64>()
        .unwrap_or(0.0)
}
