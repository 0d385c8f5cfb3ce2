use crate::error::Result;
use crate::model::ClientData;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_CHART_ENDPOINT: &str = "https://quickchart.io/chart";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartLegend {
    pub display: bool,
    pub position: String,
    pub align: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartOptions {
    pub legend: ChartLegend,
}

/// Line-chart description understood by the chart rendering service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: ChartData,
    pub options: ChartOptions,
}

impl ChartSpec {
    /// One point per measurement: client nodes and synced client nodes per day.
    pub fn from_history(source_name: &str, history: &[ClientData]) -> Self {
        let labels = history
            .iter()
            .map(|d| d.created_at().format("%Y-%m-%d").to_string())
            .collect();
        let all_nodes = history.iter().map(|d| d.client_total().to_string()).collect();
        let synced_nodes = history.iter().map(|d| d.client_synced().to_string()).collect();

        Self {
            kind: "line".to_string(),
            data: ChartData {
                labels,
                datasets: vec![
                    ChartDataset {
                        label: format!("All Nodes ({})", source_name),
                        data: all_nodes,
                    },
                    ChartDataset {
                        label: format!("Synced Nodes ({})", source_name),
                        data: synced_nodes,
                    },
                ],
            },
            options: ChartOptions {
                legend: ChartLegend {
                    display: true,
                    position: "right".to_string(),
                    align: "start".to_string(),
                },
            },
        }
    }

    /// Image URL carrying the chart as URL-encoded JSON in the `c` parameter.
    pub fn image_url(&self, endpoint: &str) -> Result<Url> {
        let json = serde_json::to_string(self)?;
        Ok(Url::parse_with_params(endpoint, &[("c", json)])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientKind;
    use crate::model::NodeCounts;
    use chrono::{TimeZone, Utc};

    fn sample(day: u32, client_total: u64, client_synced: u64) -> ClientData {
        ClientData::new(
            "ethernets",
            ClientKind::Nethermind,
            NodeCounts {
                total: 1000,
                client_total,
                total_synced: 800,
                client_synced,
            },
            Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn series_align_with_labels() {
        let history = vec![sample(1, 200, 150), sample(2, 210, 160)];
        let spec = ChartSpec::from_history("Ethernets", &history);

        assert_eq!(spec.data.labels, vec!["2024-03-01", "2024-03-02"]);
        assert_eq!(spec.data.datasets[0].label, "All Nodes (Ethernets)");
        assert_eq!(spec.data.datasets[0].data, vec!["200", "210"]);
        assert_eq!(spec.data.datasets[1].label, "Synced Nodes (Ethernets)");
        assert_eq!(spec.data.datasets[1].data, vec!["150", "160"]);
    }

    #[test]
    fn serializes_to_rendering_contract() {
        let spec = ChartSpec::from_history("Ethernets", &[sample(1, 200, 150)]);
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["type"], "line");
        assert_eq!(value["options"]["legend"]["position"], "right");
        assert_eq!(value["options"]["legend"]["align"], "start");
        assert_eq!(value["options"]["legend"]["display"], true);
        assert_eq!(value["data"]["datasets"][0]["data"][0], "200");
    }

    #[test]
    fn image_url_round_trips_the_chart() {
        let spec = ChartSpec::from_history("Ethernets", &[sample(1, 200, 150)]);
        let url = spec.image_url(DEFAULT_CHART_ENDPOINT).unwrap();
        assert_eq!(url.host_str(), Some("quickchart.io"));
        let (key, value) = url.query_pairs().next().unwrap();
        assert_eq!(key, "c");
        let decoded: ChartSpec = serde_json::from_str(&value).unwrap();
        assert_eq!(decoded, spec);
    }
}
