//! Import use-case service: reconciles extracted board content with the
//! stored board.
//!
//! # Invariants
//! - Existing records are matched by fuzzy name; matched ones are updated,
//!   the rest of the extraction is created.
//! - Every touched group gets a dense layout: extracted order first, then
//!   unmatched existing records in their previous order. Writes skip
//!   ordering checks because the positions are pre-computed.
//! - Relations match by name and type first, then by position and type.

use super::access::AccessService;
use super::{Repositories, ServiceResult};
use crate::config::CoreConfig;
use crate::import::{
    clean_text, match_by_name, plan_slots, BoardExtractor, ExtractedBoard, Slot,
    DEFAULT_NAME_MATCH_MIN_CONFIDENCE,
};
use crate::model::board::BoardId;
use crate::model::item::{Item, NewItem};
use crate::model::list::{List, ListId, NewList};
use crate::model::relation::{NewRelation, Relation, RelationType};
use crate::model::user::UserId;
use crate::ordering::OrderingChecks;
use crate::repo::item_repo::ItemRepository;
use crate::repo::list_repo::ListRepository;
use crate::repo::relation_repo::RelationRepository;
use log::info;
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;

/// Counts of records written by one import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub lists_created: usize,
    pub lists_updated: usize,
    pub items_created: usize,
    pub items_updated: usize,
    pub relations_created: usize,
    pub relations_updated: usize,
}

pub struct ImportService<'conn> {
    repos: Repositories<'conn>,
    min_confidence: f64,
}

impl<'conn> ImportService<'conn> {
    pub fn try_new(conn: &'conn Connection) -> ServiceResult<Self> {
        Ok(Self {
            repos: Repositories::try_new(conn)?,
            min_confidence: DEFAULT_NAME_MATCH_MIN_CONFIDENCE,
        })
    }

    /// Uses the configured name-match threshold.
    pub fn from_config(conn: &'conn Connection, config: &CoreConfig) -> ServiceResult<Self> {
        Ok(Self::try_new(conn)?.with_min_confidence(config.name_match_min_confidence))
    }

    /// Overrides the Dice coefficient two names need to be considered equal.
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Extracts `image` and applies the result to the board.
    pub fn import_image(
        &self,
        user_uuid: UserId,
        board_uuid: BoardId,
        extractor: &dyn BoardExtractor,
        image: &Path,
    ) -> ServiceResult<ImportSummary> {
        AccessService::new(&self.repos).board(user_uuid, board_uuid)?;
        let extracted = extractor.extract(image)?;
        self.apply(user_uuid, board_uuid, &extracted)
    }

    /// Applies already extracted content to the board.
    pub fn apply(
        &self,
        user_uuid: UserId,
        board_uuid: BoardId,
        extracted: &ExtractedBoard,
    ) -> ServiceResult<ImportSummary> {
        AccessService::new(&self.repos).board(user_uuid, board_uuid)?;

        let mut summary = ImportSummary::default();
        let (lists, list_ids) = self.reconcile_lists(board_uuid, extracted, &mut summary)?;
        self.reconcile_items(board_uuid, extracted, &lists, &list_ids, &mut summary)?;
        self.reconcile_relations(board_uuid, extracted, &mut summary)?;

        info!(
            "event=board_import module=service status=ok lists_created={} lists_updated={} items_created={} items_updated={} relations_created={} relations_updated={}",
            summary.lists_created,
            summary.lists_updated,
            summary.items_created,
            summary.items_updated,
            summary.relations_created,
            summary.relations_updated
        );
        Ok(summary)
    }

    /// Returns the board's lists in final order and, per extracted list,
    /// the id of the list it landed in.
    fn reconcile_lists(
        &self,
        board_uuid: BoardId,
        extracted: &ExtractedBoard,
        summary: &mut ImportSummary,
    ) -> ServiceResult<(Vec<ListId>, Vec<ListId>)> {
        let existing = self.repos.lists.list_lists_of_board(board_uuid)?;
        let names: Vec<String> = extracted
            .lists
            .iter()
            .enumerate()
            .map(|(index, list)| {
                clean_text(list.text.as_deref()).unwrap_or_else(|| format!("List {}", index + 1))
            })
            .collect();

        let matches = match_by_name(
            &existing.iter().map(|list| list.name.as_str()).collect::<Vec<_>>(),
            &names.iter().map(String::as_str).collect::<Vec<_>>(),
            self.min_confidence,
        );
        let slots = plan_slots(&matches, unmatched(existing.len(), &matches));

        let mut ordered = Vec::with_capacity(slots.len());
        let mut landed = vec![None; names.len()];
        for (position, slot) in slots.into_iter().enumerate() {
            let position = position as i64;
            match slot {
                Slot::Existing(index) => {
                    let current = &existing[index];
                    let source = matches.iter().position(|matched| *matched == Some(index));
                    let next = List {
                        name: source.map_or_else(|| current.name.clone(), |j| names[j].clone()),
                        position,
                        ..current.clone()
                    };
                    if next != *current {
                        self.repos.lists.update_list(&next, OrderingChecks::Skip)?;
                    }
                    if let Some(j) = source {
                        summary.lists_updated += 1;
                        landed[j] = Some(current.uuid);
                    }
                    ordered.push(current.uuid);
                }
                Slot::New(j) => {
                    let draft = NewList {
                        board_uuid,
                        name: names[j].clone(),
                        position: Some(position),
                    };
                    let list = self.repos.lists.create_list(&draft, OrderingChecks::Skip)?;
                    summary.lists_created += 1;
                    landed[j] = Some(list.uuid);
                    ordered.push(list.uuid);
                }
            }
        }

        // Every extracted list is either matched or created above.
        let landed = landed.into_iter().flatten().collect();
        Ok((ordered, landed))
    }

    fn reconcile_items(
        &self,
        board_uuid: BoardId,
        extracted: &ExtractedBoard,
        lists: &[ListId],
        list_ids: &[ListId],
        summary: &mut ImportSummary,
    ) -> ServiceResult<()> {
        let existing = self.repos.items.list_items_of_board(board_uuid)?;

        let mut incoming: Vec<(ListId, String)> = Vec::new();
        for (list, list_uuid) in extracted.lists.iter().zip(list_ids) {
            for item in &list.items {
                if let Some(name) = clean_text(item.text.as_deref()) {
                    incoming.push((*list_uuid, name));
                }
            }
        }

        let matches = match_by_name(
            &existing.iter().map(|item| item.name.as_str()).collect::<Vec<_>>(),
            &incoming.iter().map(|(_, name)| name.as_str()).collect::<Vec<_>>(),
            self.min_confidence,
        );

        for list_uuid in lists {
            let entries: Vec<usize> = (0..incoming.len())
                .filter(|k| incoming[*k].0 == *list_uuid)
                .collect();
            let entry_matches: Vec<Option<usize>> = entries.iter().map(|k| matches[*k]).collect();
            let leftovers = (0..existing.len()).filter(|index| {
                existing[*index].list_uuid == *list_uuid && !matches.contains(&Some(*index))
            });

            for (position, slot) in plan_slots(&entry_matches, leftovers).into_iter().enumerate() {
                let position = position as i64;
                match slot {
                    Slot::Existing(index) => {
                        let current = &existing[index];
                        let source = matches.iter().position(|matched| *matched == Some(index));
                        let next = Item {
                            name: source
                                .map_or_else(|| current.name.clone(), |k| incoming[k].1.clone()),
                            list_uuid: *list_uuid,
                            position,
                            ..current.clone()
                        };
                        if next != *current {
                            self.repos.items.update_item(&next, OrderingChecks::Skip)?;
                        }
                        if source.is_some() {
                            summary.items_updated += 1;
                        }
                    }
                    Slot::New(entry) => {
                        let draft = NewItem {
                            list_uuid: *list_uuid,
                            name: incoming[entries[entry]].1.clone(),
                            description: None,
                            position: Some(position),
                        };
                        self.repos.items.create_item(&draft, OrderingChecks::Skip)?;
                        summary.items_created += 1;
                    }
                }
            }
        }
        Ok(())
    }

    fn reconcile_relations(
        &self,
        board_uuid: BoardId,
        extracted: &ExtractedBoard,
        summary: &mut ImportSummary,
    ) -> ServiceResult<()> {
        let existing = self.repos.relations.list_relations_of_board(board_uuid)?;

        for relation_type in [RelationType::Vertical, RelationType::Horizontal] {
            let current: Vec<&Relation> = existing
                .iter()
                .filter(|relation| relation.relation_type == relation_type)
                .collect();
            let names: Vec<String> = extracted
                .relations
                .iter()
                .filter(|relation| relation.relation_type == relation_type)
                .enumerate()
                .map(|(index, relation)| {
                    clean_text(relation.text.as_deref())
                        .unwrap_or_else(|| format!("Relation {}", index + 1))
                })
                .collect();

            let mut matches = match_by_name(
                &current.iter().map(|relation| relation.name.as_str()).collect::<Vec<_>>(),
                &names.iter().map(String::as_str).collect::<Vec<_>>(),
                self.min_confidence,
            );
            // Second pass: an unmatched relation takes the extracted entry at
            // its own position.
            for (index, relation) in current.iter().enumerate() {
                if matches.contains(&Some(index)) {
                    continue;
                }
                if let Ok(slot) = usize::try_from(relation.position) {
                    if slot < matches.len() && matches[slot].is_none() {
                        matches[slot] = Some(index);
                    }
                }
            }

            let slots = plan_slots(&matches, unmatched(current.len(), &matches));
            for (position, slot) in slots.into_iter().enumerate() {
                let position = position as i64;
                match slot {
                    Slot::Existing(index) => {
                        let stored = current[index];
                        let source = matches.iter().position(|matched| *matched == Some(index));
                        let next = Relation {
                            name: source.map_or_else(|| stored.name.clone(), |j| names[j].clone()),
                            position,
                            ..stored.clone()
                        };
                        if next != *stored {
                            self.repos
                                .relations
                                .update_relation(&next, OrderingChecks::Skip)?;
                        }
                        if source.is_some() {
                            summary.relations_updated += 1;
                        }
                    }
                    Slot::New(j) => {
                        let draft = NewRelation {
                            board_uuid,
                            name: names[j].clone(),
                            relation_type,
                            position: Some(position),
                        };
                        self.repos
                            .relations
                            .create_relation(&draft, OrderingChecks::Skip)?;
                        summary.relations_created += 1;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Existing indices no extracted entry claimed, in their stored order.
fn unmatched(len: usize, matches: &[Option<usize>]) -> Vec<usize> {
    (0..len)
        .filter(|index| !matches.contains(&Some(*index)))
        .collect()
}
