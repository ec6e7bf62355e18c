//! Versioned governance option registry
//!
//! Every option category keeps its full history as `(height, value)`
//! versions, so any past height can be answered. The registry is only changed
//! by finalized ConfigUpdate proposals, through [`OptionRegistry::prepare_update`]
//! followed by [`OptionRegistry::commit`].

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, info};
use olt_shared_types::governance::ConfigUpdate;
use olt_shared_types::options::{GovernanceOptions, OptionCategory, OptionValue, ProposalOptionSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GovernanceError, GovernanceResult};
use crate::proposal_validation::ProposalValidator;

/// One value of a category and the height it took effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionVersion {
    pub height: u64,
    pub value: OptionValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionRegistry {
    genesis_height: u64,
    /// Versions per category, ordered by height. Shared with snapshots
    /// until the next committed update.
    history: Arc<BTreeMap<OptionCategory, Vec<OptionVersion>>>,
}

/// Statistics about the option registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionRegistryStats {
    pub categories: usize,
    pub updates_applied: usize,
    pub last_update_heights: BTreeMap<OptionCategory, u64>,
}

fn malformed(message: impl Into<String>) -> GovernanceError {
    GovernanceError::MalformedConfigUpdate(message.into())
}

/// Replaces the leaf at `fields` inside `body`. Every segment must already
/// exist, so unknown paths are rejected rather than created.
fn set_path(
    body: &mut Value,
    path: &str,
    fields: &[&str],
    new_value: &Value,
) -> GovernanceResult<()> {
    let (leaf, parents) = fields
        .split_last()
        .ok_or_else(|| malformed(format!("path {:?} names no option field", path)))?;
    let mut cursor = body;
    for segment in parents {
        cursor = cursor
            .as_object_mut()
            .and_then(|object| object.get_mut(*segment))
            .ok_or_else(|| malformed(format!("unknown option path {:?}", path)))?;
    }
    let slot = cursor
        .as_object_mut()
        .and_then(|object| object.get_mut(*leaf))
        .ok_or_else(|| malformed(format!("unknown option path {:?}", path)))?;
    if slot.is_object() {
        return Err(malformed(format!("path {:?} names a group, not a field", path)));
    }
    // Amounts travel as decimal strings; accept plain integers for them too.
    *slot = match (&*slot, new_value) {
        (Value::String(_), Value::Number(n)) if n.is_u64() => Value::String(n.to_string()),
        _ => new_value.clone(),
    };
    Ok(())
}

impl OptionRegistry {
    pub fn new(genesis: GovernanceOptions, genesis_height: u64) -> Self {
        let history: BTreeMap<_, _> = OptionCategory::ALL
            .iter()
            .map(|category| {
                let version = OptionVersion {
                    height: genesis_height,
                    value: genesis.get(*category),
                };
                (*category, vec![version])
            })
            .collect();
        Self {
            genesis_height,
            history: Arc::new(history),
        }
    }

    pub fn genesis_height(&self) -> u64 {
        self.genesis_height
    }

    fn version_at(
        &self,
        category: OptionCategory,
        height: u64,
    ) -> GovernanceResult<&OptionVersion> {
        let versions = self
            .history
            .get(&category)
            .ok_or_else(|| malformed(format!("no {} options recorded", category)))?;
        // Heights before genesis see the genesis value.
        versions
            .iter()
            .rev()
            .find(|version| version.height <= height)
            .or_else(|| versions.first())
            .ok_or_else(|| malformed(format!("no {} options recorded", category)))
    }

    /// The value of `category` in effect at `height`.
    pub fn get(&self, category: OptionCategory, height: u64) -> GovernanceResult<OptionValue> {
        Ok(self.version_at(category, height)?.value.clone())
    }

    /// Every category as of `height`.
    pub fn options_at(&self, height: u64) -> GovernanceResult<GovernanceOptions> {
        let mut options = GovernanceOptions::default();
        for category in OptionCategory::ALL {
            options.set(self.get(category, height)?);
        }
        Ok(options)
    }

    pub fn proposal_options(&self, height: u64) -> GovernanceResult<ProposalOptionSet> {
        match self.get(OptionCategory::Proposal, height)? {
            OptionValue::Proposal(options) => Ok(options),
            other => Err(malformed(format!("proposal slot holds {} options", other.category()))),
        }
    }

    pub fn fee_currency(&self, height: u64) -> GovernanceResult<String> {
        match self.get(OptionCategory::Fee, height)? {
            OptionValue::Fee(options) => Ok(options.fee_currency),
            other => Err(malformed(format!("fee slot holds {} options", other.category()))),
        }
    }

    /// Height of the latest change to `category` at or below `height`.
    pub fn last_update_height_at(
        &self,
        category: OptionCategory,
        height: u64,
    ) -> GovernanceResult<u64> {
        Ok(self.version_at(category, height)?.height)
    }

    pub fn last_update_height(&self, category: OptionCategory) -> u64 {
        self.history
            .get(&category)
            .and_then(|versions| versions.last())
            .map(|version| version.height)
            .unwrap_or(self.genesis_height)
    }

    pub fn last_update_heights_at(
        &self,
        height: u64,
    ) -> GovernanceResult<BTreeMap<OptionCategory, u64>> {
        OptionCategory::ALL
            .iter()
            .map(|category| Ok((*category, self.last_update_height_at(*category, height)?)))
            .collect()
    }

    pub fn history(&self, category: OptionCategory) -> &[OptionVersion] {
        self.history.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Computes the categories a ConfigUpdate payload would produce at
    /// `height`, without changing the registry.
    ///
    /// Paths look like `fee.minFeeDecimal` or
    /// `proposal.general.passedFundDistribution.burn`. All paths touching one
    /// category are applied together before that category is validated.
    pub fn prepare_update(
        &self,
        payload: &ConfigUpdate,
        height: u64,
        validator: &ProposalValidator,
    ) -> GovernanceResult<Vec<OptionValue>> {
        if payload.is_empty() {
            return Err(malformed("empty config update"));
        }

        let mut grouped: BTreeMap<OptionCategory, Vec<(&str, Vec<&str>, &Value)>> = BTreeMap::new();
        for (path, value) in payload {
            let mut segments = path.split('.');
            let head = segments.next().unwrap_or_default();
            let category: OptionCategory = head
                .parse()
                .map_err(|_| malformed(format!("unknown option category in {:?}", path)))?;
            let fields: Vec<&str> = segments.collect();
            if fields.iter().any(|field| field.is_empty()) {
                return Err(malformed(format!("malformed option path {:?}", path)));
            }
            grouped.entry(category).or_default().push((path.as_str(), fields, value));
        }

        let mut changed = Vec::with_capacity(grouped.len());
        for (category, updates) in grouped {
            let current = self.get(category, height)?;
            let mut body = current
                .body_json()
                .map_err(|e| malformed(format!("cannot encode {} options: {}", category, e)))?;
            for (path, fields, value) in updates {
                set_path(&mut body, path, &fields, value)?;
            }
            let updated = OptionValue::from_body_json(category, body)
                .map_err(|e| malformed(format!("invalid {} options: {}", category, e)))?;
            validator.validate_option_change(&current, &updated)?;
            debug!("Prepared {} option update at height {}", category, height);
            changed.push(updated);
        }
        Ok(changed)
    }

    /// Records prepared values as the new versions at `height`.
    /// Returns the categories that were written.
    pub fn commit(&mut self, values: Vec<OptionValue>, height: u64) -> Vec<OptionCategory> {
        let mut touched = Vec::with_capacity(values.len());
        for value in values {
            let category = value.category();
            let versions = Arc::make_mut(&mut self.history).entry(category).or_default();
            match versions.last_mut() {
                Some(last) if last.height == height => last.value = value,
                _ => versions.push(OptionVersion { height, value }),
            }
            info!("Governance {} options updated at height {}", category, height);
            touched.push(category);
        }
        touched
    }

    /// Applies one dotted-path change at `height` in a single step.
    pub fn apply(
        &mut self,
        category: OptionCategory,
        path: &str,
        value: Value,
        height: u64,
        validator: &ProposalValidator,
    ) -> GovernanceResult<()> {
        let full_path = format!("{}.{}", category, path);
        let payload: ConfigUpdate = [(full_path, value)].into();
        let values = self.prepare_update(&payload, height, validator)?;
        self.commit(values, height);
        Ok(())
    }

    pub fn get_stats(&self) -> OptionRegistryStats {
        OptionRegistryStats {
            categories: self.history.len(),
            updates_applied: self.history.values().map(|v| v.len().saturating_sub(1)).sum(),
            last_update_heights: self
                .history
                .keys()
                .map(|category| (*category, self.last_update_height(*category)))
                .collect(),
        }
    }
}
