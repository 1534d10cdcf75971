//! Atlas Admin API v2 client.
//!
//! Authenticates once with a service-account (client-credentials grant)
//! and then issues versioned JSON requests with the bearer token.
//! Pagination is handled here; callers receive complete lists.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::analyzer::thresholds;
use crate::models::{
    AccessLogEntry, AtlasAlert, AtlasCluster, AtlasSnapshot, DatabaseUser, SuggestedIndex,
};
use crate::utils::{SpectreError, SpectreResult};

const DEFAULT_BASE_URL: &str = "https://cloud.mongodb.com";
const ACCEPT_HEADER: &str = "application/vnd.atlas.2023-02-01+json";
const PAGE_SIZE: u32 = 100;

pub struct AtlasClient {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Envelope the Admin API wraps every list in.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
    #[serde(default)]
    total_count: u64,
}

impl AtlasClient {
    /// Exchange service-account credentials for a bearer token.
    pub async fn connect(
        base_url: Option<&str>,
        project_id: &str,
        client_id: &str,
        client_secret: &str,
    ) -> SpectreResult<Self> {
        let base_url = base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/').to_string();
        let http = reqwest::Client::new();

        let response = http
            .post(format!("{}/api/oauth/token", base_url))
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SpectreError::AtlasApi {
                status: response.status().as_u16(),
                detail: "service-account token request rejected; check the client id/secret"
                    .to_string(),
            });
        }
        let token: TokenResponse = response.json().await?;

        Ok(Self {
            http,
            base_url,
            project_id: project_id.to_string(),
            token: token.access_token,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> SpectreResult<T> {
        let response = self
            .http
            .get(format!("{}/api/atlas/v2/{}", self.base_url, path))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, ACCEPT_HEADER)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(SpectreError::AtlasApi { status: status.as_u16(), detail });
        }
        Ok(response.json().await?)
    }

    /// Drain a paginated list endpoint.
    async fn get_all<T: DeserializeOwned>(&self, path: &str) -> SpectreResult<Vec<T>> {
        let mut results = Vec::new();
        let mut page_num = 1u32;
        loop {
            let separator = if path.contains('?') { '&' } else { '?' };
            let page: Page<T> = self
                .get_json(&format!(
                    "{}{}pageNum={}&itemsPerPage={}",
                    path, separator, page_num, PAGE_SIZE
                ))
                .await?;
            let fetched = page.results.len();
            results.extend(page.results);
            if fetched < PAGE_SIZE as usize
                || (page.total_count > 0 && results.len() as u64 >= page.total_count)
            {
                return Ok(results);
            }
            page_num += 1;
        }
    }

    pub async fn get_cluster(&self, name: &str) -> SpectreResult<AtlasCluster> {
        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ClusterResponse {
            name: String,
            #[serde(default)]
            mongo_db_version: String,
            #[serde(default)]
            state_name: String,
            #[serde(default)]
            replication_specs: Vec<ReplicationSpec>,
        }
        #[derive(Debug, Default, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ReplicationSpec {
            #[serde(default)]
            region_configs: Vec<RegionConfig>,
        }
        #[derive(Debug, Default, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RegionConfig {
            #[serde(default)]
            electable_specs: ElectableSpecs,
        }
        #[derive(Debug, Default, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ElectableSpecs {
            #[serde(default)]
            instance_size: String,
        }

        let raw: ClusterResponse = self
            .get_json(&format!("groups/{}/clusters/{}", self.project_id, name))
            .await?;
        let instance_size_name = raw
            .replication_specs
            .first()
            .and_then(|spec| spec.region_configs.first())
            .map(|region| region.electable_specs.instance_size.clone())
            .unwrap_or_default();
        Ok(AtlasCluster {
            name: raw.name,
            instance_size_name,
            mongo_db_version: raw.mongo_db_version,
            state_name: raw.state_name,
        })
    }

    pub async fn list_cluster_names(&self) -> SpectreResult<Vec<String>> {
        #[derive(Debug, Deserialize)]
        struct ClusterName {
            name: String,
        }
        let clusters: Vec<ClusterName> =
            self.get_all(&format!("groups/{}/clusters", self.project_id)).await?;
        Ok(clusters.into_iter().map(|c| c.name).collect())
    }

    /// Performance Advisor suggestions across all processes of the project.
    pub async fn list_suggested_indexes(&self) -> SpectreResult<Vec<SuggestedIndex>> {
        #[derive(Debug, Deserialize)]
        struct Process {
            id: String,
        }
        #[derive(Debug, Default, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct SuggestedIndexesResponse {
            #[serde(default)]
            suggested_indexes: Vec<RawSuggestion>,
        }
        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RawSuggestion {
            #[serde(default)]
            namespace: String,
            #[serde(default)]
            index: Vec<std::collections::BTreeMap<String, i32>>,
            #[serde(default)]
            weight: f64,
        }

        let processes: Vec<Process> =
            self.get_all(&format!("groups/{}/processes", self.project_id)).await?;

        let mut suggestions = Vec::new();
        for process in processes {
            let reply: SuggestedIndexesResponse = match self
                .get_json(&format!(
                    "groups/{}/processes/{}/performanceAdvisor/suggestedIndexes",
                    self.project_id, process.id
                ))
                .await
            {
                Ok(reply) => reply,
                Err(err) => {
                    tracing::debug!("performance advisor unavailable for {}: {}", process.id, err);
                    continue;
                },
            };
            for raw in reply.suggested_indexes {
                let fields: Vec<String> = raw
                    .index
                    .iter()
                    .flat_map(|pair| pair.keys().cloned())
                    .collect();
                // The same namespace shows up once per process.
                if !suggestions
                    .iter()
                    .any(|s: &SuggestedIndex| s.namespace == raw.namespace && s.fields == fields)
                {
                    suggestions.push(SuggestedIndex {
                        namespace: raw.namespace,
                        fields,
                        weight: raw.weight,
                    });
                }
            }
        }
        Ok(suggestions)
    }

    pub async fn list_alerts(&self) -> SpectreResult<Vec<AtlasAlert>> {
        self.get_all(&format!("groups/{}/alerts", self.project_id)).await
    }

    pub async fn list_database_users(&self) -> SpectreResult<Vec<DatabaseUser>> {
        self.get_all(&format!("groups/{}/databaseUsers", self.project_id)).await
    }

    /// Authentication attempts against one cluster over the trailing
    /// access-log window.
    pub async fn list_access_logs(&self, cluster_name: &str) -> SpectreResult<Vec<AccessLogEntry>> {
        #[derive(Debug, Default, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct AccessLogs {
            #[serde(default)]
            access_logs: Vec<AccessLogEntry>,
        }
        let window_ms = thresholds::ACCESS_LOG_WINDOW_DAYS * 24 * 3600 * 1000;
        let start = chrono::Utc::now().timestamp_millis() - window_ms;
        let reply: AccessLogs = self
            .get_json(&format!(
                "groups/{}/dbAccessHistory/clusters/{}?start={}",
                self.project_id, cluster_name, start
            ))
            .await?;
        Ok(reply.access_logs)
    }

    /// MongoDB versions currently offered to this project.
    pub async fn list_available_versions(&self) -> SpectreResult<Vec<String>> {
        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct AvailableVersion {
            #[serde(default)]
            version: String,
        }
        let versions: Vec<AvailableVersion> = self
            .get_all(&format!("groups/{}/mongoDBVersions", self.project_id))
            .await?;
        Ok(versions
            .into_iter()
            .map(|v| v.version)
            .filter(|v| !v.is_empty())
            .collect())
    }

    /// Gather the complete Atlas snapshot for one cluster. Advisory
    /// endpoints that fail are logged and skipped; the audit proceeds on
    /// what was fetched.
    pub async fn snapshot(&self, cluster_name: Option<&str>) -> SpectreResult<AtlasSnapshot> {
        let mut snapshot = AtlasSnapshot::default();

        let cluster_name = match cluster_name {
            Some(name) => Some(name.to_string()),
            None => self.list_cluster_names().await?.into_iter().next(),
        };

        if let Some(name) = &cluster_name {
            match self.get_cluster(name).await {
                Ok(cluster) => snapshot.cluster = Some(cluster),
                Err(err) => tracing::warn!("cannot describe cluster '{}': {}", name, err),
            }
            match self.list_access_logs(name).await {
                Ok(logs) => snapshot.access_logs = logs,
                Err(err) => tracing::debug!("access logs unavailable: {}", err),
            }
        }

        match self.list_database_users().await {
            Ok(users) => snapshot.users = users,
            Err(err) => tracing::debug!("database users unavailable: {}", err),
        }
        match self.list_alerts().await {
            Ok(alerts) => snapshot.alerts = alerts,
            Err(err) => tracing::debug!("alerts unavailable: {}", err),
        }
        match self.list_suggested_indexes().await {
            Ok(suggestions) => snapshot.suggested_indexes = suggestions,
            Err(err) => tracing::debug!("suggested indexes unavailable: {}", err),
        }
        match self.list_available_versions().await {
            Ok(versions) => snapshot.available_versions = versions,
            Err(err) => tracing::debug!("available versions unavailable: {}", err),
        }

        Ok(snapshot)
    }
}
