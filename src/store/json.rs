use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{apply_bulk_status, ensure_unique_key, ExpenseInstanceStore, RecurringTemplateStore};
use crate::{
    domain::{ExpenseInstance, PaymentStatus, RecurringTemplate, TemplateId, YearMonth},
    errors::{Result, SchedulerError},
};

const TEMPLATES_FILE: &str = "templates.json";
const INSTANCES_FILE: &str = "instances.json";
const TMP_SUFFIX: &str = "tmp";

/// Filesystem-backed JSON persistence for templates and instances.
///
/// Writes are staged to a temporary sibling and renamed into place. All
/// read-modify-write cycles are serialized through one process-local lock.
pub struct JsonFileStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Opens the store at `root`, creating the directory when missing.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn templates_path(&self) -> PathBuf {
        self.root.join(TEMPLATES_FILE)
    }

    pub fn instances_path(&self) -> PathBuf {
        self.root.join(INSTANCES_FILE)
    }

    async fn read_templates(&self) -> Result<Vec<RecurringTemplate>> {
        let templates: Vec<RecurringTemplate> = read_collection(&self.templates_path()).await?;
        for template in &templates {
            template.validate().map_err(|err| {
                SchedulerError::Storage(format!(
                    "{} holds an invalid template: {}",
                    TEMPLATES_FILE, err
                ))
            })?;
        }
        Ok(templates)
    }

    async fn read_instances(&self) -> Result<Vec<ExpenseInstance>> {
        read_collection(&self.instances_path()).await
    }
}

#[async_trait]
impl RecurringTemplateStore for JsonFileStore {
    async fn list_active(&self) -> Result<Vec<RecurringTemplate>> {
        let _guard = self.lock.lock().await;
        let mut templates = self.read_templates().await?;
        templates.retain(|template| template.active);
        Ok(templates)
    }

    async fn list_templates(&self) -> Result<Vec<RecurringTemplate>> {
        let _guard = self.lock.lock().await;
        self.read_templates().await
    }

    async fn upsert(&self, template: RecurringTemplate) -> Result<()> {
        template.validate()?;
        let _guard = self.lock.lock().await;
        let mut templates = self.read_templates().await?;
        match templates.iter_mut().find(|existing| existing.id == template.id) {
            Some(existing) => *existing = template,
            None => templates.push(template),
        }
        templates.sort_by(|a, b| a.id.cmp(&b.id));
        write_collection(&self.templates_path(), &templates).await
    }

    async fn set_active(&self, id: &TemplateId, active: bool) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut templates = self.read_templates().await?;
        let template = templates
            .iter_mut()
            .find(|template| &template.id == id)
            .ok_or_else(|| SchedulerError::TemplateNotFound(id.clone()))?;
        template.active = active;
        write_collection(&self.templates_path(), &templates).await
    }
}

#[async_trait]
impl ExpenseInstanceStore for JsonFileStore {
    async fn list_for_month(&self, year_month: YearMonth) -> Result<Vec<ExpenseInstance>> {
        let _guard = self.lock.lock().await;
        let mut instances = self.read_instances().await?;
        instances.retain(|instance| instance.year_month == year_month);
        Ok(instances)
    }

    async fn list_all(&self) -> Result<Vec<ExpenseInstance>> {
        let _guard = self.lock.lock().await;
        self.read_instances().await
    }

    async fn create(&self, instance: ExpenseInstance) -> Result<ExpenseInstance> {
        let _guard = self.lock.lock().await;
        let mut instances = self.read_instances().await?;
        ensure_unique_key(&instances, &instance)?;
        instances.push(instance.clone());
        write_collection(&self.instances_path(), &instances).await?;
        Ok(instance)
    }

    async fn bulk_set_status(
        &self,
        year_month: YearMonth,
        status: PaymentStatus,
        at: DateTime<Utc>,
    ) -> Result<usize> {
        let _guard = self.lock.lock().await;
        let mut instances = self.read_instances().await?;
        let updated = apply_bulk_status(&mut instances, year_month, status, at);
        if updated > 0 {
            write_collection(&self.instances_path(), &instances).await?;
        }
        Ok(updated)
    }

    async fn mark_paid(&self, id: Uuid, at: DateTime<Utc>) -> Result<ExpenseInstance> {
        let _guard = self.lock.lock().await;
        let mut instances = self.read_instances().await?;
        let instance = instances
            .iter_mut()
            .find(|instance| instance.id == id)
            .ok_or(SchedulerError::InstanceNotFound(id))?;
        instance.mark_paid(at);
        let updated = instance.clone();
        write_collection(&self.instances_path(), &instances).await?;
        Ok(updated)
    }
}

async fn read_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !tokio::fs::try_exists(path).await? {
        return Ok(Vec::new());
    }
    let data = tokio::fs::read_to_string(path).await?;
    if data.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&data)?)
}

async fn write_collection<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let json = serde_json::to_string_pretty(items)?;
    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}
