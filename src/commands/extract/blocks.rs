use crate::model::Metric;

/// One metric-header row and the market rows that follow it, up to the
/// next metric header.
#[derive(Debug)]
pub(crate) struct MetricBlock {
    pub metric: Metric,
    pub header_row: Vec<String>,
    pub market_rows: Vec<Vec<String>>,
}

#[derive(Debug, Default)]
pub(crate) struct Partition {
    pub blocks: Vec<MetricBlock>,
    /// First fields of rows that appear before any metric header. They
    /// belong to no block and contribute nothing to the model.
    pub orphan_rows: Vec<String>,
}

/// First pass over the data rows: group them into per-metric blocks so the
/// second pass never depends on a mutable "current metric" threading
/// through the walk.
pub(crate) fn partition_rows(rows: &[Vec<String>]) -> Partition {
    let mut partition = Partition::default();

    for row in rows {
        let label = row.first().map(String::as_str).unwrap_or("");
        if label.is_empty() {
            continue;
        }

        if let Some(metric) = Metric::from_label(label) {
            partition.blocks.push(MetricBlock {
                metric,
                header_row: row.clone(),
                market_rows: Vec::new(),
            });
        } else if let Some(block) = partition.blocks.last_mut() {
            block.market_rows.push(row.clone());
        } else {
            partition.orphan_rows.push(label.to_string());
        }
    }

    partition
}

/// Split CSV text into trimmed rows, dropping blank lines. Commas are hard
/// delimiters; embedded-comma or quoted fields are not supported.
pub(crate) fn split_rows(csv_text: &str) -> Vec<Vec<String>> {
    csv_text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.split(',')
                .map(|field| field.trim().to_string())
                .collect()
        })
        .collect()
}
