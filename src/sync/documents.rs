//! Entity ↔ remote-document conversion.
//!
//! Remote documents are untyped field maps. Encoding writes optional fields
//! only when present, so a field cleared locally is never cleared remotely
//! (the merge-write asymmetry documented on [`crate::remote::RemoteStore`]).
//! Decoding is permissive: missing or mistyped fields fall back to defaults
//! instead of failing the restore.

use sea_orm::ActiveValue;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::constants::DEFAULT_LIST_NAME;
use crate::entities::{list, step, task};
use crate::remote::Document;

pub fn list_to_document(list: &list::Model) -> Document {
    let mut doc = Document::new();
    doc.insert("name".to_string(), json!(list.name));
    doc.insert("color".to_string(), json!(list.color));
    if let Some(emoji) = &list.emoji {
        doc.insert("emoji".to_string(), json!(emoji));
    }
    doc.insert("createdAt".to_string(), json!(list.created_at));
    doc.insert("position".to_string(), json!(list.position));
    doc
}

pub fn list_from_document(id: Uuid, doc: &Document) -> list::ActiveModel {
    list::ActiveModel {
        id: ActiveValue::Set(id),
        name: ActiveValue::Set(get_string_or(doc, "name", DEFAULT_LIST_NAME)),
        color: ActiveValue::Set(get_i64(doc, "color") as i32),
        emoji: ActiveValue::Set(opt_string(doc, "emoji")),
        created_at: ActiveValue::Set(get_i64(doc, "createdAt")),
        position: ActiveValue::Set(get_i64(doc, "position") as i32),
    }
}

pub fn task_to_document(task: &task::Model) -> Document {
    let mut doc = Document::new();
    doc.insert("title".to_string(), json!(task.title));
    if let Some(description) = &task.description {
        doc.insert("description".to_string(), json!(description));
    }
    doc.insert("isCompleted".to_string(), json!(task.is_completed));
    doc.insert("isImportant".to_string(), json!(task.is_important));
    doc.insert("inMyDay".to_string(), json!(task.in_my_day));
    doc.insert("createdAt".to_string(), json!(task.created_at));
    doc.insert("modifiedAt".to_string(), json!(task.modified_at));
    if let Some(due_date) = task.due_date {
        doc.insert("dueDate".to_string(), json!(due_date));
    }
    if let Some(reminder_at) = task.reminder_at {
        doc.insert("reminderAt".to_string(), json!(reminder_at));
    }
    doc.insert("position".to_string(), json!(task.position));
    doc
}

pub fn task_from_document(id: Uuid, list_id: Uuid, doc: &Document) -> task::ActiveModel {
    task::ActiveModel {
        id: ActiveValue::Set(id),
        title: ActiveValue::Set(get_string(doc, "title")),
        description: ActiveValue::Set(opt_string(doc, "description")),
        is_completed: ActiveValue::Set(get_bool(doc, "isCompleted")),
        is_important: ActiveValue::Set(get_bool(doc, "isImportant")),
        in_my_day: ActiveValue::Set(get_bool(doc, "inMyDay")),
        created_at: ActiveValue::Set(get_i64(doc, "createdAt")),
        modified_at: ActiveValue::Set(get_i64(doc, "modifiedAt")),
        due_date: ActiveValue::Set(opt_i64(doc, "dueDate")),
        reminder_at: ActiveValue::Set(opt_i64(doc, "reminderAt")),
        position: ActiveValue::Set(get_i64(doc, "position") as i32),
        list_id: ActiveValue::Set(Some(list_id)),
    }
}

pub fn step_to_document(step: &step::Model) -> Document {
    let mut doc = Document::new();
    doc.insert("title".to_string(), json!(step.title));
    doc.insert("isCompleted".to_string(), json!(step.is_completed));
    doc.insert("position".to_string(), json!(step.position));
    doc
}

pub fn step_from_document(id: Uuid, task_id: Uuid, doc: &Document) -> step::ActiveModel {
    step::ActiveModel {
        id: ActiveValue::Set(id),
        task_id: ActiveValue::Set(task_id),
        title: ActiveValue::Set(get_string(doc, "title")),
        is_completed: ActiveValue::Set(get_bool(doc, "isCompleted")),
        position: ActiveValue::Set(get_i64(doc, "position") as i32),
    }
}

fn get_string(doc: &Document, key: &str) -> String {
    get_string_or(doc, key, "")
}

fn get_string_or(doc: &Document, key: &str, default: &str) -> String {
    opt_string(doc, key).unwrap_or_else(|| default.to_string())
}

fn opt_string(doc: &Document, key: &str) -> Option<String> {
    doc.get(key).and_then(Value::as_str).map(str::to_string)
}

fn get_i64(doc: &Document, key: &str) -> i64 {
    opt_i64(doc, key).unwrap_or(0)
}

/// Numbers are accepted as JSON numbers or numeric strings.
fn opt_i64(doc: &Document, key: &str) -> Option<i64> {
    match doc.get(key) {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.parse::<i64>().ok(),
        _ => None,
    }
}

fn get_bool(doc: &Document, key: &str) -> bool {
    doc.get(key).and_then(Value::as_bool).unwrap_or(false)
}
