use std::io::Write as _;
use std::path::{Path, PathBuf};

use comfygit_consts::node_group_name;
use indexmap::IndexMap;
use toml_edit::{value, Array, DocumentMut, Formatted, InlineTable, Item, Table, Value};

use crate::document::{
    array_push_unique, array_remove_value, get_or_insert_array, get_or_insert_implicit_table,
    get_or_insert_table,
};
use crate::error::{ManifestError, ManifestResult};
use crate::model::{
    CustomNodeMapping, EnvironmentConfig, ModelCriticality, ModelRecord, ModelResolutionStatus,
    ModelSourceRef, NodeEntry, NodeSource, WorkflowEntry, WorkflowModelEntry, WorkflowModelNodeRef,
};

/// Handle on the `.cec/pyproject.toml` manifest: reads, typed mutations, and
/// atomic persistence. Comments and key order always survive a round trip
/// because every mutation goes through `toml_edit`'s document model rather
/// than a deserialize/re-serialize cycle.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub path: PathBuf,
    document: DocumentMut,
}

impl Manifest {
    /// Creates a brand-new, minimal manifest in memory (not yet saved).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let mut document = DocumentMut::new();
        get_or_insert_table(document.as_table_mut(), "project");
        Self {
            path: path.into(),
            document,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> ManifestResult<Self> {
        let path = path.as_ref().to_path_buf();
        let contents = fs_err::read_to_string(&path).map_err(|e| ManifestError::Io {
            path: path.clone(),
            source: e,
        })?;
        Self::from_str(path, &contents)
    }

    pub fn from_str(path: PathBuf, contents: &str) -> ManifestResult<Self> {
        let document: DocumentMut = contents.parse().map_err(|e: toml_edit::TomlError| {
            let offset = e.span().map(|s| s.start).unwrap_or(0);
            ManifestError::Parse {
                path: path.clone(),
                message: e.message().to_string(),
                offset,
            }
        })?;
        Ok(Self { path, document })
    }

    /// Writes the manifest atomically: temp file in the same directory,
    /// `fsync`, then rename. Leaves the previous file intact on any error.
    pub fn save(&self) -> ManifestResult<()> {
        let rendered = self.document.to_string();
        let tmp_path = self.path.with_extension("toml.tmp");
        {
            let mut tmp = fs_err::File::create(&tmp_path).map_err(|e| ManifestError::Io {
                path: tmp_path.clone(),
                source: e,
            })?;
            tmp.write_all(rendered.as_bytes())
                .map_err(|e| ManifestError::Io {
                    path: tmp_path.clone(),
                    source: e,
                })?;
            tmp.sync_all().map_err(|e| ManifestError::Io {
                path: tmp_path.clone(),
                source: e,
            })?;
        }
        fs_err::rename(&tmp_path, &self.path).map_err(|e| ManifestError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(())
    }

    pub fn document(&self) -> &DocumentMut {
        &self.document
    }

    fn root(&mut self) -> &mut Table {
        self.document.as_table_mut()
    }

    fn comfygit_table(&mut self) -> &mut Table {
        let root = self.document.as_table_mut();
        let tool = get_or_insert_implicit_table(root, "tool");
        get_or_insert_implicit_table(tool, "comfygit")
    }

    fn comfygit_table_ref(&self) -> Option<&Table> {
        self.document
            .get("tool")?
            .as_table()?
            .get("comfygit")?
            .as_table()
    }

    // ---------------------------------------------------------------- project.dependencies

    fn project_table(&mut self) -> &mut Table {
        get_or_insert_table(self.root(), "project")
    }

    /// Adds a PEP 508 requirement string to `project.dependencies`, or to an
    /// optional group if `group` is given. Idempotent: re-adding an existing
    /// entry is a no-op.
    pub fn add_dependency(&mut self, requirement: &str, group: Option<&str>) {
        match group {
            None => {
                let project = self.project_table();
                let array = get_or_insert_array(project, "dependencies");
                array_push_unique(array, requirement);
            }
            Some(group) => self.add_optional_dependency(group, requirement),
        }
    }

    pub fn add_optional_dependency(&mut self, group: &str, requirement: &str) {
        let project = self.project_table();
        let optional = get_or_insert_table(project, "optional-dependencies");
        let array = get_or_insert_array(optional, group);
        array_push_unique(array, requirement);
    }

    /// Adds every requirement parsed from a `requirements.txt` file's lines
    /// (comments and blank lines already filtered by the caller) to `group`.
    pub fn add_dependencies_from_list(&mut self, group: &str, requirements: &[String]) {
        for requirement in requirements {
            self.add_optional_dependency(group, requirement);
        }
    }

    pub fn remove_dependency(&mut self, requirement_name: &str, group: Option<&str>) {
        match group {
            None => {
                let project = self.project_table();
                if let Some(array) = project.get_mut("dependencies").and_then(Item::as_array_mut) {
                    array_remove_value(array, requirement_name);
                    remove_matching_prefix(array, requirement_name);
                }
            }
            Some(group) => self.remove_optional_dependency(group, requirement_name),
        }
    }

    pub fn remove_optional_dependency(&mut self, group: &str, requirement_name: &str) {
        let project = self.project_table();
        if let Some(optional) = project.get_mut("optional-dependencies").and_then(Item::as_table_mut) {
            if let Some(array) = optional.get_mut(group).and_then(Item::as_array_mut) {
                array_remove_value(array, requirement_name);
                remove_matching_prefix(array, requirement_name);
            }
        }
    }

    /// Removes an entire optional-dependency group (used when a node package
    /// is removed).
    pub fn remove_optional_group(&mut self, group: &str) {
        let project = self.project_table();
        if let Some(optional) = project.get_mut("optional-dependencies").and_then(Item::as_table_mut) {
            optional.remove(group);
        }
    }

    pub fn list_dependencies(&self, group: Option<&str>) -> Vec<String> {
        let Some(project) = self.document.get("project").and_then(Item::as_table) else {
            return Vec::new();
        };
        match group {
            None => project
                .get("dependencies")
                .and_then(Item::as_array)
                .map(array_strings)
                .unwrap_or_default(),
            Some(group) => project
                .get("optional-dependencies")
                .and_then(Item::as_table)
                .and_then(|t| t.get(group))
                .and_then(Item::as_array)
                .map(array_strings)
                .unwrap_or_default(),
        }
    }

    /// All dependencies, main and every optional group, in declaration order.
    pub fn list_all_dependencies(&self) -> IndexMap<Option<String>, Vec<String>> {
        let mut out = IndexMap::new();
        out.insert(None, self.list_dependencies(None));
        if let Some(optional) = self
            .document
            .get("project")
            .and_then(Item::as_table)
            .and_then(|t| t.get("optional-dependencies"))
            .and_then(Item::as_table)
        {
            for (group, _) in optional.iter() {
                out.insert(Some(group.to_string()), self.list_dependencies(Some(group)));
            }
        }
        out
    }

    // ---------------------------------------------------------------- tool.comfygit.environment

    pub fn environment_config(&self) -> EnvironmentConfig {
        let Some(table) = self
            .comfygit_table_ref()
            .and_then(|t| t.get("environment"))
            .and_then(Item::as_table)
        else {
            return EnvironmentConfig::default();
        };
        EnvironmentConfig {
            comfyui_ref: string_field(table, "comfyui_ref"),
            python_version: string_field(table, "python_version"),
            torch_backend: string_field(table, "torch_backend"),
            torch_version: string_field(table, "torch_version"),
            torch_index_url: string_field(table, "torch_index_url"),
        }
    }

    pub fn set_environment_config(&mut self, config: &EnvironmentConfig) {
        let comfygit = self.comfygit_table();
        let table = get_or_insert_table(comfygit, "environment");
        set_opt_string(table, "comfyui_ref", &config.comfyui_ref);
        set_opt_string(table, "python_version", &config.python_version);
        set_opt_string(table, "torch_backend", &config.torch_backend);
        set_opt_string(table, "torch_version", &config.torch_version);
        set_opt_string(table, "torch_index_url", &config.torch_index_url);
    }

    /// Strips every torch source/index pin, leaving `torch_backend` (the
    /// user's declared intent) untouched. Used before a cross-platform
    /// PyTorch reinstall.
    pub fn strip_torch_install_state(&mut self) {
        let comfygit = self.comfygit_table();
        if let Some(table) = get_or_insert_table(comfygit, "environment").as_table_mut() {
            table.remove("torch_version");
            table.remove("torch_index_url");
        }
    }

    // ---------------------------------------------------------------- tool.comfygit.nodes

    pub fn get_node(&self, package_id: &str) -> Option<NodeEntry> {
        let nodes = self
            .comfygit_table_ref()?
            .get("nodes")?
            .as_table()?
            .get(package_id)?
            .as_table()?;
        Some(NodeEntry {
            name: string_field(nodes, "name")?,
            repository: string_field(nodes, "repository"),
            version: string_field(nodes, "version"),
            source: NodeSource::parse(&string_field(nodes, "source")?)?,
        })
    }

    pub fn list_nodes(&self) -> IndexMap<String, NodeEntry> {
        let mut out = IndexMap::new();
        if let Some(nodes) = self
            .comfygit_table_ref()
            .and_then(|t| t.get("nodes"))
            .and_then(Item::as_table)
        {
            for (id, _) in nodes.iter() {
                if let Some(entry) = self.get_node(id) {
                    out.insert(id.to_string(), entry);
                }
            }
        }
        out
    }

    /// Upserts `tool.<product>.nodes.<package_id>`. Idempotent.
    pub fn set_node(&mut self, package_id: &str, entry: &NodeEntry) {
        let comfygit = self.comfygit_table();
        let nodes = get_or_insert_table(comfygit, "nodes");
        let table = get_or_insert_table(nodes, package_id);
        table.insert("name", value(entry.name.as_str()));
        match &entry.repository {
            Some(repo) => {
                table.insert("repository", value(repo.as_str()));
            }
            None => {
                table.remove("repository");
            }
        }
        match &entry.version {
            Some(v) => {
                table.insert("version", value(v.as_str()));
            }
            None => {
                table.remove("version");
            }
        }
        table.insert("source", value(entry.source.as_str()));
    }

    /// Removes a node's manifest footprint entirely: its `nodes.<id>` record,
    /// its `node/<id>` dependency group, and every workflow's
    /// `custom_node_map` entry pointing at it.
    pub fn remove_node(&mut self, package_id: &str) {
        {
            let comfygit = self.comfygit_table();
            if let Some(nodes) = get_or_insert_table(comfygit, "nodes").as_table_mut() {
                nodes.remove(package_id);
            }
        }
        self.remove_optional_group(&node_group_name(package_id));

        let workflow_names: Vec<String> = self.list_workflow_names();
        for name in workflow_names {
            self.remove_custom_node_map_target(&name, package_id);
        }
    }

    fn remove_custom_node_map_target(&mut self, workflow_name: &str, package_id: &str) {
        let Some(workflows) = self
            .comfygit_table()
            .get_mut("workflows")
            .and_then(Item::as_table_mut)
        else {
            return;
        };
        let Some(workflow) = workflows.get_mut(workflow_name).and_then(Item::as_table_mut) else {
            return;
        };
        let Some(map) = workflow.get_mut("custom_node_map").and_then(Item::as_table_mut) else {
            return;
        };
        let targets: Vec<String> = map
            .iter()
            .filter(|(_, v)| {
                v.as_str()
                    .map(|s| s == package_id)
                    .unwrap_or(false)
            })
            .map(|(k, _)| k.to_string())
            .collect();
        for key in targets {
            map.remove(&key);
        }
    }

    // ---------------------------------------------------------------- tool.comfygit.models

    pub fn get_model(&self, criticality: ModelCriticality, hash: &str) -> Option<ModelRecord> {
        let table = self
            .comfygit_table_ref()?
            .get("models")?
            .as_table()?
            .get(criticality.as_str())?
            .as_table()?
            .get(hash)?
            .as_table()?;
        Some(ModelRecord {
            hash: hash.to_string(),
            filename: string_field(table, "filename")?,
            size: table.get("size").and_then(Item::as_integer).unwrap_or(0) as u64,
            relative_path: string_field(table, "relative_path")?,
            blake3_hash: string_field(table, "blake3_hash"),
            sha256_hash: string_field(table, "sha256_hash"),
            sources: parse_model_sources(table),
        })
    }

    pub fn list_models(&self, criticality: ModelCriticality) -> IndexMap<String, ModelRecord> {
        let mut out = IndexMap::new();
        if let Some(table) = self
            .comfygit_table_ref()
            .and_then(|t| t.get("models"))
            .and_then(Item::as_table)
            .and_then(|t| t.get(criticality.as_str()))
            .and_then(Item::as_table)
        {
            for (hash, _) in table.iter() {
                if let Some(record) = self.get_model(criticality, hash) {
                    out.insert(hash.to_string(), record);
                }
            }
        }
        out
    }

    /// Upserts a model record by hash within a category. Idempotent.
    pub fn upsert_model(&mut self, criticality: ModelCriticality, record: &ModelRecord) {
        let comfygit = self.comfygit_table();
        let models = get_or_insert_table(comfygit, "models");
        let category = get_or_insert_table(models, criticality.as_str());
        let table = get_or_insert_table(category, &record.hash);
        table.insert("filename", value(record.filename.as_str()));
        table.insert("size", value(record.size as i64));
        table.insert("relative_path", value(record.relative_path.as_str()));
        match &record.blake3_hash {
            Some(h) => {
                table.insert("blake3_hash", value(h.as_str()));
            }
            None => {
                table.remove("blake3_hash");
            }
        }
        match &record.sha256_hash {
            Some(h) => {
                table.insert("sha256_hash", value(h.as_str()));
            }
            None => {
                table.remove("sha256_hash");
            }
        }
        let mut sources = ArrayOfTablesBuilder::default();
        for source in &record.sources {
            let mut t = InlineTable::new();
            t.insert("source_type", Value::from(source.source_type.as_str()));
            t.insert("url", Value::from(source.url.as_str()));
            sources.push_inline(t);
        }
        table.insert("sources", sources.into_item());
    }

    pub fn delete_model(&mut self, criticality: ModelCriticality, hash: &str) {
        let comfygit = self.comfygit_table();
        if let Some(models) = get_or_insert_table(comfygit, "models").as_table_mut() {
            if let Some(category) = models.get_mut(criticality.as_str()).and_then(Item::as_table_mut) {
                category.remove(hash);
            }
        }
    }

    pub fn add_model_source(&mut self, criticality: ModelCriticality, hash: &str, source: &ModelSourceRef) {
        if let Some(mut record) = self.get_model(criticality, hash) {
            let dup = record
                .sources
                .iter()
                .any(|s| s.url == source.url && s.source_type == source.source_type);
            if !dup {
                record.sources.push(source.clone());
                self.upsert_model(criticality, &record);
            }
        }
    }

    // ---------------------------------------------------------------- tool.comfygit.workflows

    pub fn list_workflow_names(&self) -> Vec<String> {
        self.comfygit_table_ref()
            .and_then(|t| t.get("workflows"))
            .and_then(Item::as_table)
            .map(|t| t.iter().map(|(k, _)| k.to_string()).collect())
            .unwrap_or_default()
    }

    pub fn get_workflow(&self, name: &str) -> Option<WorkflowEntry> {
        let table = self
            .comfygit_table_ref()?
            .get("workflows")?
            .as_table()?
            .get(name)?
            .as_table()?;
        let nodes = table
            .get("nodes")
            .and_then(Item::as_array)
            .map(array_strings)
            .unwrap_or_default();
        let mut custom_node_map = IndexMap::new();
        if let Some(map) = table.get("custom_node_map").and_then(Item::as_table) {
            for (node_type, v) in map.iter() {
                let mapping = match v.as_str() {
                    Some(id) => CustomNodeMapping::Package(id.to_string()),
                    None => CustomNodeMapping::Optional(v.as_bool().unwrap_or(false)),
                };
                custom_node_map.insert(node_type.to_string(), mapping);
            }
        }
        let models = table
            .get("models")
            .and_then(Item::as_array_of_tables)
            .map(|aot| aot.iter().filter_map(parse_workflow_model_entry).collect())
            .unwrap_or_default();
        Some(WorkflowEntry {
            nodes,
            custom_node_map,
            models,
        })
    }

    pub fn set_workflow_nodes(&mut self, name: &str, nodes: &[String]) {
        let comfygit = self.comfygit_table();
        let workflows = get_or_insert_table(comfygit, "workflows");
        let workflow = get_or_insert_table(workflows, name);
        let mut array = Array::new();
        for id in nodes {
            array.push(id.as_str());
        }
        workflow.insert("nodes", Item::Value(Value::Array(array)));
    }

    pub fn set_custom_node_map(&mut self, name: &str, node_type: &str, mapping: &CustomNodeMapping) {
        let comfygit = self.comfygit_table();
        let workflows = get_or_insert_table(comfygit, "workflows");
        let workflow = get_or_insert_table(workflows, name);
        let map = get_or_insert_table(workflow, "custom_node_map");
        match mapping {
            CustomNodeMapping::Package(id) => {
                map.insert(node_type, value(id.as_str()));
            }
            CustomNodeMapping::Optional(_) => {
                map.insert(node_type, value(false));
            }
        }
    }

    /// Upserts one entry in `workflows.<name>.models`, matched by filename +
    /// node provenance (there may be several distinct references to files
    /// with the same name). Replaces an existing entry in place if found so
    /// progressive persistence never duplicates a decision.
    pub fn upsert_workflow_model(&mut self, name: &str, entry: &WorkflowModelEntry) {
        let comfygit = self.comfygit_table();
        let workflows = get_or_insert_table(comfygit, "workflows");
        let workflow = get_or_insert_table(workflows, name);
        if workflow.get("models").is_none() {
            workflow.insert("models", Item::ArrayOfTables(toml_edit::ArrayOfTables::new()));
        }
        let models = workflow
            .get_mut("models")
            .and_then(Item::as_array_of_tables_mut)
            .expect("just inserted");

        let existing_idx = models.iter().position(|t| {
            t.get("nodes")
                .and_then(Item::as_array)
                .map(|a| nodes_array_matches(a, &entry.nodes))
                .unwrap_or(false)
        });

        let rendered = render_workflow_model_entry(entry);
        match existing_idx {
            Some(idx) => replace_table_at(models, idx, rendered),
            None => {
                models.push(rendered);
            }
        }
    }

    pub fn delete_workflow(&mut self, name: &str) {
        let comfygit = self.comfygit_table();
        if let Some(workflows) = get_or_insert_table(comfygit, "workflows").as_table_mut() {
            workflows.remove(name);
        }
    }

    // ---------------------------------------------------------------- tool.uv.constraint-dependencies

    fn uv_table(&mut self) -> &mut Table {
        let root = self.root();
        let tool = get_or_insert_implicit_table(root, "tool");
        get_or_insert_table(tool, "uv")
    }

    pub fn list_constraints(&self) -> IndexMap<String, String> {
        let mut out = IndexMap::new();
        if let Some(array) = self
            .document
            .get("tool")
            .and_then(Item::as_table)
            .and_then(|t| t.get("uv"))
            .and_then(Item::as_table)
            .and_then(|t| t.get("constraint-dependencies"))
            .and_then(Item::as_array)
        {
            for v in array.iter() {
                if let Some(s) = v.as_str() {
                    let name = constraint_name(s);
                    out.insert(name, s.to_string());
                }
            }
        }
        out
    }

    /// Adds (or replaces, matched by leading package name) a constraint.
    pub fn set_constraint(&mut self, spec: &str) {
        let name = constraint_name(spec);
        let uv = self.uv_table();
        let array = get_or_insert_array(uv, "constraint-dependencies");
        let indices: Vec<usize> = array
            .iter()
            .enumerate()
            .filter(|(_, v)| v.as_str().map(|s| constraint_name(s) == name).unwrap_or(false))
            .map(|(i, _)| i)
            .collect();
        for idx in indices.into_iter().rev() {
            array.remove(idx);
        }
        array.push(spec);
    }

    pub fn remove_constraint(&mut self, name: &str) {
        let uv = self.uv_table();
        if let Some(array) = uv.get_mut("constraint-dependencies").and_then(Item::as_array_mut) {
            let indices: Vec<usize> = array
                .iter()
                .enumerate()
                .filter(|(_, v)| v.as_str().map(|s| constraint_name(s) == name).unwrap_or(false))
                .map(|(i, _)| i)
                .collect();
            for idx in indices.into_iter().rev() {
                array.remove(idx);
            }
        }
    }
}

impl Manifest {
    /// Builds a fully materialized, read-only snapshot of every section.
    /// Convenient for callers (the reconciler, the resolution engine) that
    /// want to reason about the whole manifest at once; mutation always goes
    /// back through the typed setters above, never through this view.
    pub fn view(&self) -> crate::model::ManifestView {
        let mut workflows = IndexMap::new();
        for name in self.list_workflow_names() {
            if let Some(entry) = self.get_workflow(&name) {
                workflows.insert(name, entry);
            }
        }
        let mut models = IndexMap::new();
        models.insert(ModelCriticality::Required, self.list_models(ModelCriticality::Required));
        models.insert(ModelCriticality::Optional, self.list_models(ModelCriticality::Optional));

        crate::model::ManifestView {
            main_dependencies: self.list_dependencies(None),
            optional_dependencies: self
                .list_all_dependencies()
                .into_iter()
                .filter_map(|(k, v)| k.map(|k| (k, v)))
                .collect(),
            environment: self.environment_config(),
            nodes: self.list_nodes(),
            models,
            workflows,
            constraints: self.list_constraints(),
        }
    }
}

fn constraint_name(spec: &str) -> String {
    spec.split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_' || c == '.'))
        .next()
        .unwrap_or(spec)
        .to_lowercase()
}

fn string_field(table: &Table, key: &str) -> Option<String> {
    table.get(key).and_then(Item::as_str).map(str::to_string)
}

fn set_opt_string(table: &mut Table, key: &str, v: &Option<String>) {
    match v {
        Some(s) => {
            table.insert(key, value(s.as_str()));
        }
        None => {
            table.remove(key);
        }
    }
}

fn array_strings(array: &Array) -> Vec<String> {
    array.iter().filter_map(|v| v.as_str().map(str::to_string)).collect()
}

/// Requirement strings are `name<extras><specifier>`; drop anything added via
/// a plain name match too (covers a caller passing just the package name).
fn remove_matching_prefix(array: &mut Array, name: &str) {
    let indices: Vec<usize> = array
        .iter()
        .enumerate()
        .filter(|(_, v)| {
            v.as_str()
                .map(|s| requirement_name(s).eq_ignore_ascii_case(name))
                .unwrap_or(false)
        })
        .map(|(i, _)| i)
        .collect();
    for idx in indices.into_iter().rev() {
        array.remove(idx);
    }
}

fn requirement_name(requirement: &str) -> &str {
    requirement
        .split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_' || c == '.'))
        .next()
        .unwrap_or(requirement)
}

fn parse_model_sources(table: &Table) -> Vec<ModelSourceRef> {
    let Some(array) = table.get("sources").and_then(Item::as_array) else {
        return Vec::new();
    };
    array
        .iter()
        .filter_map(|v| v.as_inline_table())
        .filter_map(|t| {
            Some(ModelSourceRef {
                source_type: t.get("source_type")?.as_str()?.to_string(),
                url: t.get("url")?.as_str()?.to_string(),
            })
        })
        .collect()
}

fn nodes_array_matches(array: &Array, expected: &[WorkflowModelNodeRef]) -> bool {
    if array.len() != expected.len() {
        return false;
    }
    array.iter().zip(expected.iter()).all(|(v, exp)| {
        v.as_inline_table()
            .map(|t| {
                t.get("node_id").and_then(Value::as_str) == Some(exp.node_id.as_str())
                    && t.get("widget_index").and_then(Value::as_integer)
                        == Some(exp.widget_index)
            })
            .unwrap_or(false)
    })
}

fn render_workflow_model_entry(entry: &WorkflowModelEntry) -> Table {
    let mut table = Table::new();
    table.insert("filename", value(entry.filename.as_str()));
    if let Some(h) = &entry.hash {
        table.insert("hash", value(h.as_str()));
    }
    table.insert("category", value(entry.category.as_str()));
    table.insert("criticality", value(entry.criticality.as_str()));
    table.insert("status", value(entry.status.as_str()));
    table.insert("auto_resolved", value(entry.auto_resolved));

    let mut sources = Array::new();
    for s in &entry.sources {
        let mut t = InlineTable::new();
        t.insert("source_type", Value::from(s.source_type.as_str()));
        t.insert("url", Value::from(s.url.as_str()));
        sources.push(Value::InlineTable(t));
    }
    table.insert("sources", Item::Value(Value::Array(sources)));

    let mut nodes = Array::new();
    for n in &entry.nodes {
        let mut t = InlineTable::new();
        t.insert("node_id", Value::from(n.node_id.as_str()));
        t.insert("node_type", Value::from(n.node_type.as_str()));
        t.insert(
            "widget_index",
            Value::Integer(Formatted::new(n.widget_index)),
        );
        t.insert("widget_value", Value::from(n.widget_value.as_str()));
        nodes.push(Value::InlineTable(t));
    }
    table.insert("nodes", Item::Value(Value::Array(nodes)));
    table
}

fn parse_workflow_model_entry(table: &Table) -> Option<WorkflowModelEntry> {
    let nodes = table
        .get("nodes")
        .and_then(Item::as_array)
        .map(|array| {
            array
                .iter()
                .filter_map(|v| v.as_inline_table())
                .filter_map(|t| {
                    Some(WorkflowModelNodeRef {
                        node_id: t.get("node_id")?.as_str()?.to_string(),
                        node_type: t.get("node_type")?.as_str()?.to_string(),
                        widget_index: t.get("widget_index")?.as_integer()?,
                        widget_value: t.get("widget_value")?.as_str()?.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    Some(WorkflowModelEntry {
        filename: string_field(table, "filename")?,
        hash: string_field(table, "hash"),
        category: string_field(table, "category")?,
        criticality: ModelCriticality::parse(&string_field(table, "criticality")?)?,
        status: ModelResolutionStatus::parse(&string_field(table, "status")?)?,
        sources: parse_model_sources(table),
        nodes,
        auto_resolved: table
            .get("auto_resolved")
            .and_then(Item::as_bool)
            .unwrap_or(false),
    })
}

/// Replaces the table at `idx` in place. `ArrayOfTables` only exposes
/// push/remove, so this pops everything from `idx` onward, pushes the
/// replacement, then pushes the rest back in their original order.
fn replace_table_at(aot: &mut toml_edit::ArrayOfTables, idx: usize, table: Table) {
    let mut rest: Vec<Table> = Vec::new();
    while aot.len() > idx {
        rest.push(aot.remove(idx));
    }
    rest.remove(0); // drop the old entry being replaced
    aot.push(table);
    for t in rest {
        aot.push(t);
    }
}

#[derive(Default)]
struct ArrayOfTablesBuilder {
    array: Array,
}

impl ArrayOfTablesBuilder {
    fn push_inline(&mut self, table: InlineTable) {
        self.array.push(Value::InlineTable(table));
    }

    fn into_item(self) -> Item {
        Item::Value(Value::Array(self.array))
    }
}
