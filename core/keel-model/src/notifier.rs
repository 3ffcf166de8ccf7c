//! Fan-out of datasource events to the actions bound to a component.
//!
//! Each registered action declares the listener roles it plays. An event is
//! delivered to an action when one of its roles accepts the event's role;
//! collection listeners also receive plain datasource events.

use std::sync::Arc;

use serde_json::Value;

use crate::Entity;

/// Lifecycle state of a datasource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasourceState {
    NotInitialized,
    Invalid,
    Valid,
}

/// What changed in a collection datasource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionOperation {
    Refresh,
    Clear,
    Add,
    Remove,
    Update,
}

#[derive(Debug, Clone, Copy)]
pub enum DatasourceEvent<'a> {
    StateChanged {
        datasource: &'a str,
        previous: DatasourceState,
        current: DatasourceState,
    },
    ItemChanged {
        datasource: &'a str,
        previous: Option<&'a Entity>,
        current: Option<&'a Entity>,
    },
    CollectionChanged {
        datasource: &'a str,
        operation: CollectionOperation,
    },
    ValueChanged {
        item: &'a Entity,
        property: &'a str,
        previous: Option<&'a Value>,
        current: Option<&'a Value>,
    },
}

impl DatasourceEvent<'_> {
    /// The listener role an action must play to receive this event.
    pub fn role(&self) -> ListenerRole {
        match self {
            DatasourceEvent::StateChanged { .. } | DatasourceEvent::ItemChanged { .. } => {
                ListenerRole::Datasource
            }
            DatasourceEvent::CollectionChanged { .. } => ListenerRole::CollectionDatasource,
            DatasourceEvent::ValueChanged { .. } => ListenerRole::Value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerRole {
    /// Datasource state and current-item changes, plus value changes.
    Datasource,
    /// Collection changes, plus everything a `Datasource` listener receives.
    CollectionDatasource,
    /// Property value changes on the current item.
    Value,
}

impl ListenerRole {
    /// Whether a listener in this role receives events of role `event`.
    pub fn accepts(self, event: ListenerRole) -> bool {
        match (self, event) {
            (ListenerRole::CollectionDatasource, _) => true,
            (ListenerRole::Datasource, ListenerRole::Datasource | ListenerRole::Value) => true,
            (ListenerRole::Datasource, ListenerRole::CollectionDatasource) => false,
            (ListenerRole::Value, event) => event == ListenerRole::Value,
        }
    }
}

pub type ActionHandler = Arc<dyn Fn(&DatasourceEvent<'_>) + Send + Sync>;

struct RegisteredAction {
    id: String,
    roles: Vec<ListenerRole>,
    handler: ActionHandler,
}

/// Ordered set of actions listening to one datasource.
#[derive(Default)]
pub struct ActionsNotifier {
    actions: Vec<RegisteredAction>,
}

impl ActionsNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an action. An action with the same id is replaced in place.
    pub fn add_action(&mut self, id: &str, roles: &[ListenerRole], handler: ActionHandler) {
        let action = RegisteredAction {
            id: id.to_string(),
            roles: roles.to_vec(),
            handler,
        };
        match self.actions.iter_mut().find(|a| a.id == id) {
            Some(existing) => *existing = action,
            None => self.actions.push(action),
        }
    }

    /// Returns true if an action was removed.
    pub fn remove_action(&mut self, id: &str) -> bool {
        let before = self.actions.len();
        self.actions.retain(|a| a.id != id);
        self.actions.len() != before
    }

    /// Registered action ids, in registration order.
    pub fn action_ids(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.id.as_str()).collect()
    }

    /// Delivers `event` to every action whose roles accept it, in
    /// registration order. Returns the number of deliveries.
    pub fn notify(&self, event: &DatasourceEvent<'_>) -> usize {
        let role = event.role();
        let mut delivered = 0;
        for action in &self.actions {
            if action.roles.iter().any(|r| r.accepts(role)) {
                (action.handler)(event);
                delivered += 1;
            }
        }
        delivered
    }
}
