// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Named status conditions set from handler outcomes.

use crate::error::ControllerError;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenericCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

/// A status type that may carry conditions. Statuses without conditions keep
/// the default and conditions become a no-op for them.
pub trait ConditionedStatus {
    fn conditions(&self) -> &[GenericCondition] {
        &[]
    }

    fn conditions_mut(&mut self) -> Option<&mut Vec<GenericCondition>> {
        None
    }
}

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A condition type, e.g. `Cond::new("Reconciled")`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cond(String);

impl Cond {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// `None` marks the condition True with an empty message; an error marks it
    /// False with the error text, reason defaulting to `Error`.
    pub fn set_error<S: ConditionedStatus>(
        &self,
        status: &mut S,
        reason: &str,
        err: Option<&ControllerError>,
    ) {
        match err {
            None => self.set(status, "True", reason, String::new()),
            Some(err) => {
                let reason = if reason.is_empty() { "Error" } else { reason };
                self.set(status, "False", reason, err.to_string())
            }
        }
    }

    pub fn last_updated<S: ConditionedStatus>(&self, status: &mut S, timestamp: String) {
        if let Some(condition) = self.find_or_create(status) {
            condition.last_update_time = Some(timestamp);
        }
    }

    pub fn get<'a, S: ConditionedStatus>(&self, status: &'a S) -> Option<&'a GenericCondition> {
        status
            .conditions()
            .iter()
            .find(|c| c.condition_type == self.0)
    }

    pub fn is_true<S: ConditionedStatus>(&self, status: &S) -> bool {
        self.get(status).is_some_and(|c| c.status == "True")
    }

    fn set<S: ConditionedStatus>(
        &self,
        status: &mut S,
        value: &str,
        reason: &str,
        message: String,
    ) {
        let Some(condition) = self.find_or_create(status) else {
            return;
        };
        if condition.status != value {
            condition.status = value.to_string();
            condition.last_transition_time = Some(now_rfc3339());
        }
        condition.reason = reason.to_string();
        condition.message = message;
    }

    fn find_or_create<'a, S: ConditionedStatus>(
        &self,
        status: &'a mut S,
    ) -> Option<&'a mut GenericCondition> {
        let conditions = status.conditions_mut()?;
        let position = match conditions.iter().position(|c| c.condition_type == self.0) {
            Some(position) => position,
            None => {
                conditions.push(GenericCondition {
                    condition_type: self.0.clone(),
                    ..Default::default()
                });
                conditions.len() - 1
            }
        };
        conditions.get_mut(position)
    }
}
