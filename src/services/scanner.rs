//! Code scanner: find MongoDB collection/field/write references in a
//! source tree.
//!
//! Regex-driven and deliberately heuristic. The scanner recognizes the
//! common driver call shapes of JavaScript/TypeScript, Go, Python, Java
//! and Rust code:
//!
//! ```text
//! const users = db.collection("users")     // handle bound to a variable
//! users.find({ status: "active" })         // query fields
//! users.insertOne({ email, createdAt: new Date() })  // written fields
//! coll := db.Collection("orders")          // Go
//! db["events"].find_one({"type": "click"}) // Python
//! ```
//!
//! Handles are resolved per file; a chained call
//! (`db.collection("x").find(...)`) resolves inline.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{CollectionRef, FieldRef, ScanResult, WriteRef};
use crate::utils::{SpectreError, SpectreResult};

/// Source extensions worth scanning.
const SOURCE_EXTENSIONS: &[&str] =
    &["js", "jsx", "ts", "tsx", "mjs", "cjs", "go", "py", "java", "rs"];

/// Directories that never contain first-party code.
const SKIPPED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "target",
    "vendor",
    "dist",
    "build",
    "__pycache__",
    ".venv",
    "venv",
];

/// `<var> = db.collection("name")` in its JS/Go/Python/Java/Rust spellings.
static COLLECTION_BINDING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?:(?:const|let|var)\s+)?(\w+)\s*(?::?=|:=)\s*.*?\.(?:collection|getCollection|get_collection|Collection)\s*(?:::<[^>]*>)?\(\s*["']([\w.-]+)["']"#,
    )
    .unwrap()
});

/// Chained or unbound collection access: `db.collection("name")`.
static COLLECTION_ACCESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\.(?:collection|getCollection|get_collection|Collection)\s*(?:::<[^>]*>)?\(\s*["']([\w.-]+)["']\s*\)"#,
    )
    .unwrap()
});

/// Python subscript binding: `users = db["users"]`.
static SUBSCRIPT_BINDING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(\w+)\s*=\s*\w+\[["']([\w.-]+)["']\]"#).unwrap());

/// Query-shaped method calls on a handle.
static QUERY_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([\w)\]]+)\.(find|Find|findOne|FindOne|find_one|countDocuments|CountDocuments|count_documents|distinct|Distinct|deleteOne|DeleteOne|delete_one|deleteMany|DeleteMany|delete_many)\s*\(",
    )
    .unwrap()
});

/// Write-shaped method calls on a handle.
static WRITE_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([\w)\]]+)\.(insertOne|InsertOne|insert_one|insertMany|InsertMany|insert_many|updateOne|UpdateOne|update_one|updateMany|UpdateMany|update_many|replaceOne|ReplaceOne|replace_one|save)\s*\(",
    )
    .unwrap()
});

pub struct CodeScanner {
    root: PathBuf,
}

impl CodeScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Scan the tree and aggregate references. Unreadable files are
    /// skipped; an unreadable root is an error.
    pub fn scan(&self) -> SpectreResult<ScanResult> {
        if !self.root.exists() {
            return Err(SpectreError::Scan {
                path: self.root.display().to_string(),
                detail: "path does not exist".to_string(),
            });
        }

        let mut files = Vec::new();
        collect_files(&self.root, &mut files);
        files.sort();

        let mut result = ScanResult::default();
        for file in files {
            let Ok(content) = fs::read_to_string(&file) else {
                continue;
            };
            let display = file
                .strip_prefix(&self.root)
                .unwrap_or(&file)
                .display()
                .to_string();
            scan_file(&display, &content, &mut result);
        }

        tracing::info!(
            "scanned {} collection reference(s), {} field reference(s), {} write reference(s)",
            result.refs.len(),
            result.field_refs.len(),
            result.write_refs.len()
        );
        Ok(result)
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        if path.is_dir() {
            if !SKIPPED_DIRS.contains(&name.as_str()) && !name.starts_with('.') {
                collect_files(&path, out);
            }
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e))
        {
            out.push(path);
        }
    }
}

fn scan_file(file: &str, content: &str, result: &mut ScanResult) {
    // Pass 1: handle bindings and collection references.
    let mut handles: HashMap<String, String> = HashMap::new();
    for (line_index, line) in content.lines().enumerate() {
        let line_no = (line_index + 1) as u32;
        for capture in COLLECTION_BINDING.captures_iter(line) {
            handles.insert(capture[1].to_string(), capture[2].to_string());
        }
        for capture in SUBSCRIPT_BINDING.captures_iter(line) {
            handles.insert(capture[1].to_string(), capture[2].to_string());
        }
        for capture in COLLECTION_ACCESS.captures_iter(line) {
            record_collection(result, &capture[1], file, line_no);
        }
    }

    // Pass 2: query and write calls, resolved against the handles.
    let mut offset = 0usize;
    for (line_index, line) in content.lines().enumerate() {
        let line_no = (line_index + 1) as u32;

        for capture in QUERY_CALL.captures_iter(line) {
            let Some(collection) = resolve_handle(&handles, &capture[1], line) else {
                continue;
            };
            record_collection(result, &collection, file, line_no);
            let call_end = offset + capture.get(0).unwrap().end();
            if let Some(args) = balanced_region(content, call_end - 1, '(', ')')
                && let Some(object) = first_object(args)
            {
                for (field, _) in top_level_entries(object) {
                    if field == "_id" || field.starts_with('$') {
                        continue;
                    }
                    result.field_refs.push(FieldRef {
                        collection: collection.clone(),
                        field,
                        file: file.to_string(),
                        line: line_no,
                    });
                }
            }
        }

        for capture in WRITE_CALL.captures_iter(line) {
            let Some(collection) = resolve_handle(&handles, &capture[1], line) else {
                continue;
            };
            record_collection(result, &collection, file, line_no);
            let method = &capture[2];
            let call_end = offset + capture.get(0).unwrap().end();
            let Some(args) = balanced_region(content, call_end - 1, '(', ')') else {
                continue;
            };
            let object = if method.starts_with("update") {
                update_document(args)
            } else {
                first_object(args)
            };
            let Some(object) = object else { continue };
            for (field, value_type) in top_level_entries(object) {
                if field == "_id" || field.starts_with('$') {
                    continue;
                }
                result.write_refs.push(WriteRef {
                    collection: collection.clone(),
                    field,
                    file: file.to_string(),
                    line: line_no,
                    value_type,
                });
            }
        }

        offset += line.len() + 1;
    }
}

fn record_collection(result: &mut ScanResult, collection: &str, file: &str, line: u32) {
    if !result
        .collections
        .iter()
        .any(|c| c.eq_ignore_ascii_case(collection))
    {
        result.collections.push(collection.to_string());
    }
    let reference = CollectionRef {
        collection: collection.to_string(),
        file: file.to_string(),
        line,
    };
    if !result.refs.contains(&reference) {
        result.refs.push(reference);
    }
}

/// Receiver resolution: a bound handle wins; a chained
/// `.collection("x").find` resolves from the same line.
fn resolve_handle(handles: &HashMap<String, String>, receiver: &str, line: &str) -> Option<String> {
    if let Some(collection) = handles.get(receiver) {
        return Some(collection.clone());
    }
    COLLECTION_ACCESS
        .captures(line)
        .map(|capture| capture[1].to_string())
}

/// The text between a matched pair of delimiters starting at `open_at`.
fn balanced_region(content: &str, open_at: usize, open: char, close: char) -> Option<&str> {
    let bytes = content.as_bytes();
    if open_at >= bytes.len() || bytes[open_at] != open as u8 {
        return None;
    }
    let mut depth = 0i32;
    let mut in_string: Option<u8> = None;
    for (i, &b) in bytes.iter().enumerate().skip(open_at) {
        match in_string {
            Some(quote) => {
                if b == quote && bytes.get(i - 1) != Some(&b'\\') {
                    in_string = None;
                }
            },
            None => {
                if b == b'"' || b == b'\'' {
                    in_string = Some(b);
                } else if b == open as u8 {
                    depth += 1;
                } else if b == close as u8 {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&content[open_at + 1..i]);
                    }
                }
            },
        }
        // A runaway region means unbalanced source; give up quietly.
        if i - open_at > 4000 {
            return None;
        }
    }
    None
}

/// The first `{...}` object literal inside a call-argument region.
fn first_object(args: &str) -> Option<&str> {
    let start = args.find('{')?;
    balanced_region(args, start, '{', '}')
}

/// The update document of an update call: the keys of `$set`-style
/// operators in the second argument, falling back to its literal keys.
fn update_document(args: &str) -> Option<&str> {
    let first_start = args.find('{')?;
    let first = balanced_region(args, first_start, '{', '}')?;
    let second_start = first_start + first.len() + 2;
    let rest = &args[second_start.min(args.len())..];
    let update_start = rest.find('{')?;
    let update = balanced_region(rest, update_start, '{', '}')?;

    for operator in ["$set", "$setOnInsert", "$inc", "$push"] {
        if let Some(at) = update.find(operator) {
            let after = &update[at + operator.len()..];
            if let Some(inner_start) = after.find('{')
                && let Some(inner) = balanced_region(after, inner_start, '{', '}')
            {
                return Some(inner);
            }
        }
    }
    Some(update)
}

/// Top-level `(key, value-type)` entries of an object literal body.
fn top_level_entries(object: &str) -> Vec<(String, String)> {
    static KEY: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"^\s*["']?([\w.$]+)["']?\s*:"#).unwrap());

    let mut entries = Vec::new();
    let bytes = object.as_bytes();
    let mut depth = 0i32;
    let mut in_string: Option<u8> = None;
    let mut segment_start = 0usize;

    for (i, &b) in bytes.iter().enumerate() {
        match in_string {
            Some(quote) => {
                if b == quote && bytes.get(i.wrapping_sub(1)) != Some(&b'\\') {
                    in_string = None;
                }
            },
            None => match b {
                b'"' | b'\'' => in_string = Some(b),
                b'{' | b'[' | b'(' => depth += 1,
                b'}' | b']' | b')' => depth -= 1,
                b',' if depth == 0 => {
                    push_entry(&KEY, &object[segment_start..i], &mut entries);
                    segment_start = i + 1;
                },
                _ => {},
            },
        }
    }
    push_entry(&KEY, &object[segment_start..], &mut entries);
    entries
}

fn push_entry(key: &Regex, segment: &str, entries: &mut Vec<(String, String)>) {
    let Some(capture) = key.captures(segment) else {
        // `{ email }` shorthand carries a field with no inferable type.
        let bare = segment.trim();
        if !bare.is_empty()
            && bare.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !bare.chars().next().is_some_and(|c| c.is_ascii_digit())
        {
            entries.push((bare.to_string(), "unknown".to_string()));
        }
        return;
    };
    let field = capture[1].to_string();
    let value = segment[capture.get(0).unwrap().end()..].trim();
    entries.push((field, infer_value_type(value).to_string()));
}

/// Literal-based BSON type inference; anything dynamic is "unknown".
fn infer_value_type(value: &str) -> &'static str {
    let v = value.trim();
    if v.starts_with('"') || v.starts_with('\'') || v.starts_with('`') {
        "string"
    } else if v == "true" || v == "false" {
        "bool"
    } else if v == "null" || v == "None" {
        "null"
    } else if v.starts_with('[') {
        "array"
    } else if v.starts_with('{') {
        "object"
    } else if v.starts_with("new Date") || v.starts_with("Date.now") || v.starts_with("datetime") {
        "date"
    } else if v.starts_with("ObjectId") || v.starts_with("new ObjectId") {
        "objectId"
    } else if !v.is_empty() && v.chars().next().is_some_and(|c| c.is_ascii_digit() || c == '-') {
        if v.contains('.') { "double" } else { "int" }
    } else {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn scan_source(name: &str, source: &str) -> ScanResult {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        write!(file, "{}", source).unwrap();
        CodeScanner::new(dir.path()).scan().unwrap()
    }

    #[test]
    fn finds_bound_handle_queries() {
        let result = scan_source(
            "user.js",
            r#"
const users = db.collection("users");
users.find({ status: "active", age: { $gt: 21 } });
"#,
        );
        assert_eq!(result.collections, vec!["users"]);
        let fields: Vec<&str> = result.field_refs.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["status", "age"]);
        assert_eq!(result.field_refs[0].line, 3);
    }

    #[test]
    fn finds_chained_call() {
        let result = scan_source(
            "orders.ts",
            r#"await db.collection("orders").findOne({ customerId: id });"#,
        );
        assert_eq!(result.collections, vec!["orders"]);
        assert_eq!(result.field_refs[0].field, "customerId");
    }

    #[test]
    fn finds_go_collection_binding() {
        let result = scan_source(
            "store.go",
            r#"
coll := client.Database("app").Collection("events")
res, err := coll.Find(ctx, bson.M{"type": "click"})
"#,
        );
        assert_eq!(result.collections, vec!["events"]);
        assert_eq!(result.field_refs[0].field, "type");
    }

    #[test]
    fn finds_python_subscript() {
        let result = scan_source(
            "store.py",
            r#"
events = db["events"]
doc = events.find_one({"session": sid})
"#,
        );
        assert_eq!(result.collections, vec!["events"]);
        assert_eq!(result.field_refs[0].field, "session");
    }

    #[test]
    fn insert_infers_value_types() {
        let result = scan_source(
            "user.js",
            r#"
const users = db.collection("users");
users.insertOne({ email: "a@b.c", age: 30, active: true, createdAt: new Date(), score: 1.5 });
"#,
        );
        let by_field: HashMap<&str, &str> = result
            .write_refs
            .iter()
            .map(|w| (w.field.as_str(), w.value_type.as_str()))
            .collect();
        assert_eq!(by_field["email"], "string");
        assert_eq!(by_field["age"], "int");
        assert_eq!(by_field["active"], "bool");
        assert_eq!(by_field["createdAt"], "date");
        assert_eq!(by_field["score"], "double");
    }

    #[test]
    fn update_reads_set_operator() {
        let result = scan_source(
            "user.js",
            r#"
const users = db.collection("users");
users.updateOne({ _id: id }, { $set: { nickname: "x", lastSeen: new Date() } });
"#,
        );
        let fields: Vec<&str> = result.write_refs.iter().map(|w| w.field.as_str()).collect();
        assert_eq!(fields, vec!["nickname", "lastSeen"]);
    }

    #[test]
    fn id_and_operator_keys_are_skipped() {
        let result = scan_source(
            "user.js",
            r#"
const users = db.collection("users");
users.find({ _id: id, $comment: "x" });
"#,
        );
        assert!(result.field_refs.is_empty());
    }

    #[test]
    fn shorthand_fields_are_unknown() {
        let result = scan_source(
            "user.js",
            r#"
const users = db.collection("users");
users.insertOne({ email, name });
"#,
        );
        let by_field: HashMap<&str, &str> = result
            .write_refs
            .iter()
            .map(|w| (w.field.as_str(), w.value_type.as_str()))
            .collect();
        assert_eq!(by_field["email"], "unknown");
        assert_eq!(by_field["name"], "unknown");
    }

    #[test]
    fn multiline_calls_are_followed() {
        let result = scan_source(
            "user.js",
            r#"
const users = db.collection("users");
users.find({
  status: "active",
  plan: "pro",
});
"#,
        );
        let fields: Vec<&str> = result.field_refs.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["status", "plan"]);
    }

    #[test]
    fn missing_root_is_an_error() {
        assert!(CodeScanner::new("/definitely/not/a/path").scan().is_err());
    }

    #[test]
    fn non_source_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "db.collection(\"users\")").unwrap();
        let result = CodeScanner::new(dir.path()).scan().unwrap();
        assert!(result.is_empty());
    }
}
