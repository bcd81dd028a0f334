use billing_scheduler_domain::{
    Entity, RecurringSchedule, ReminderRule, SentReminder, TenantScope, ID,
};
use std::sync::Mutex;

/// Entities that belong to exactly one tenant
pub trait TenantOwned: Entity {
    fn tenant_id(&self) -> &ID;
}

impl TenantOwned for RecurringSchedule {
    fn tenant_id(&self) -> &ID {
        &self.tenant_id
    }
}

impl TenantOwned for ReminderRule {
    fn tenant_id(&self) -> &ID {
        &self.tenant_id
    }
}

impl TenantOwned for SentReminder {
    fn tenant_id(&self) -> &ID {
        &self.tenant_id
    }
}

/// Useful functions for creating inmemory repositories

fn owned_by<T: TenantOwned>(val: &T, tenant: &TenantScope) -> bool {
    *val.tenant_id() == tenant.tenant_id
}

pub fn insert<T: Clone>(val: &T, collection: &Mutex<Vec<T>>) {
    let mut collection = collection.lock().unwrap();
    collection.push(val.clone());
}

/// Replaces the stored entity with the same id. Returns false if there was none.
pub fn save<T: Clone + TenantOwned>(val: &T, collection: &Mutex<Vec<T>>) -> bool {
    let mut collection = collection.lock().unwrap();
    match collection
        .iter_mut()
        .find(|item| item.id() == val.id() && item.tenant_id() == val.tenant_id())
    {
        Some(item) => {
            *item = val.clone();
            true
        }
        None => false,
    }
}

pub fn find<T: Clone + TenantOwned>(
    tenant: &TenantScope,
    val_id: &ID,
    collection: &Mutex<Vec<T>>,
) -> Option<T> {
    let collection = collection.lock().unwrap();
    collection
        .iter()
        .find(|item| item.id() == val_id && owned_by(*item, tenant))
        .cloned()
}

pub fn find_by<T: Clone + TenantOwned, F: FnMut(&T) -> bool>(
    tenant: &TenantScope,
    collection: &Mutex<Vec<T>>,
    mut compare: F,
) -> Vec<T> {
    let collection = collection.lock().unwrap();
    collection
        .iter()
        .filter(|item| owned_by(*item, tenant) && compare(item))
        .cloned()
        .collect()
}

pub fn delete<T: Clone + TenantOwned>(
    tenant: &TenantScope,
    val_id: &ID,
    collection: &Mutex<Vec<T>>,
) -> Option<T> {
    let mut collection = collection.lock().unwrap();
    let index = collection
        .iter()
        .position(|item| item.id() == val_id && owned_by(item, tenant))?;
    Some(collection.remove(index))
}

/// Applies `update` to the entity with the given id. Returns false if it was not found.
pub fn update<T: TenantOwned, U: FnOnce(&mut T)>(
    tenant: &TenantScope,
    val_id: &ID,
    collection: &Mutex<Vec<T>>,
    update: U,
) -> bool {
    let mut collection = collection.lock().unwrap();
    match collection
        .iter_mut()
        .find(|item| item.id() == val_id && owned_by(&**item, tenant))
    {
        Some(item) => {
            update(item);
            true
        }
        None => false,
    }
}
