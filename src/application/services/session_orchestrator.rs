//! Session Orchestrator - The per-room round and turn state machine
//!
//! Drives one [`RoomSession`] through `CardSelection -> ActiveTurn ->
//! CardSelection` until the scenario completes. Every command is validated
//! before anything is mutated, so a rejected command leaves the room exactly
//! as it was.
//!
//! # Architecture
//!
//! The orchestrator depends only on outbound ports. It never owns a room: the
//! room actor lends it the aggregate for the duration of one command, and
//! takes back the events to broadcast.
//!
//! AI turns are not run inline. When a monster or AI summon becomes active
//! the turn is marked `ai_scheduled`, and the actor calls
//! [`SessionOrchestrator::run_scheduled_ai`] after broadcasting the events
//! that led there.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::application::dto::{CharacterSetup, GameCommand, GameResult};
use crate::application::ports::outbound::{
    ContentPort, EquippedBonuses, GameResultRepository, InventoryPort, PathfindingPort,
};
use crate::application::services::ai::{plan_monster_turn, plan_summon_turn};
use crate::application::services::errors::GameError;
use crate::domain::aggregates::{RoomSession, Roster, ScenarioOutcome, SessionPhase};
use crate::domain::entities::{
    CardSelection, Character, CombatProfile, Combatant, EntityType, ExhaustionReason, LootToken,
    ObjectiveDefinition, RestType, Summon, SummonDefinition, TurnStats,
};
use crate::domain::events::{GameEvent, PlayerStat};
use crate::domain::services::turn_order::{self, InitiativeRules, TurnOrderEntry};
use crate::domain::services::{
    build_context, elemental, record_progress, resolve_attack, AttackContext, DeckOwner,
    ObjectiveEvaluator,
};
use crate::domain::value_objects::{AxialCoord, Condition, EngineSettings, EntityId, LootId};

/// Result of a scenario completion check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCheck {
    pub complete: bool,
    pub victory: bool,
    pub reason: Option<String>,
}

impl CompletionCheck {
    fn ongoing() -> Self {
        Self {
            complete: false,
            victory: false,
            reason: None,
        }
    }

    fn defeat(reason: impl Into<String>) -> Self {
        Self {
            complete: true,
            victory: false,
            reason: Some(reason.into()),
        }
    }

    fn victory(reason: impl Into<String>) -> Self {
        Self {
            complete: true,
            victory: true,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Clone)]
pub struct SessionOrchestrator {
    content: Arc<dyn ContentPort>,
    inventory: Arc<dyn InventoryPort>,
    pathfinder: Arc<dyn PathfindingPort>,
    results: Arc<dyn GameResultRepository>,
    evaluator: ObjectiveEvaluator,
    settings: EngineSettings,
}

impl SessionOrchestrator {
    pub fn new(
        content: Arc<dyn ContentPort>,
        inventory: Arc<dyn InventoryPort>,
        pathfinder: Arc<dyn PathfindingPort>,
        results: Arc<dyn GameResultRepository>,
        evaluator: ObjectiveEvaluator,
        settings: EngineSettings,
    ) -> Self {
        Self {
            content,
            inventory,
            pathfinder,
            results,
            evaluator,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    /// Add a player's character to a room still in the lobby.
    ///
    /// A player who already has a character gets its id back.
    #[instrument(skip(self, room, setup), fields(room_id = %room.id))]
    pub async fn join_character(
        &self,
        room: &mut RoomSession,
        player_id: &str,
        setup: CharacterSetup,
    ) -> Result<EntityId, GameError> {
        if let Some(existing) = room.roster.character_for_user(player_id) {
            return Ok(existing.core.id);
        }
        if room.phase != SessionPhase::Lobby {
            return Err(GameError::Conflict("Game already started".into()));
        }
        if setup.max_health <= 0 {
            return Err(GameError::validation("Max health must be positive"));
        }
        let position = room
            .scenario
            .starting_positions
            .get(room.roster.characters.len())
            .copied()
            .ok_or_else(|| GameError::validation("Room is full"))?;

        let hand: Vec<String> = self
            .content
            .get_cards_by_class(&setup.class_name)
            .await?
            .into_iter()
            .map(|card| card.id)
            .collect();
        if hand.len() < 2 {
            return Err(GameError::not_found(format!(
                "Ability cards for class {}",
                setup.class_name
            )));
        }

        let id = room.next_entity_id();
        let character = Character::with_id(
            id,
            player_id,
            setup.name,
            setup.class_name,
            setup.max_health,
            position,
        )
        .with_hand(hand);
        info!(character_id = %id, player_id, "Character joined");
        room.roster.characters.push(character);
        Ok(id)
    }

    /// Leave the lobby: draw monster initiatives and open card selection
    #[instrument(skip(self, room), fields(room_id = %room.id))]
    pub fn start_game(&self, room: &mut RoomSession) -> Result<Vec<GameEvent>, GameError> {
        if room.phase != SessionPhase::Lobby {
            return Err(GameError::Conflict("Game already started".into()));
        }
        if room.roster.characters.is_empty() {
            return Err(GameError::validation(
                "At least one character must join before starting",
            ));
        }

        room.round = 1;
        for definition in room.scenario.objectives.all().filter(|d| d.track_progress) {
            room.objective_progress
                .entry(definition.id.clone())
                .or_default();
        }

        info!(
            scenario = %room.scenario.id,
            characters = room.roster.characters.len(),
            "Game started"
        );
        let mut events = Vec::new();
        self.enter_card_selection(room, &mut events);
        Ok(events)
    }

    #[instrument(skip(self, room, command), fields(room_id = %room.id, command = command.name()))]
    pub async fn handle_command(
        &self,
        room: &mut RoomSession,
        player_id: &str,
        command: GameCommand,
    ) -> Result<Vec<GameEvent>, GameError> {
        match room.phase {
            SessionPhase::Completed => {
                return Err(GameError::Conflict("Scenario already completed".into()))
            }
            SessionPhase::Lobby => return Err(GameError::validation("Game has not started")),
            SessionPhase::CardSelection | SessionPhase::ActiveTurn => {}
        }

        let mut events = Vec::new();
        match command {
            GameCommand::SelectCards {
                character_id,
                top_card_id,
                bottom_card_id,
            } => {
                self.select_cards(
                    room,
                    player_id,
                    character_id,
                    top_card_id,
                    bottom_card_id,
                    &mut events,
                )
                .await?
            }
            GameCommand::MoveCharacter {
                character_id,
                target_hex,
            } => self.move_figure(room, player_id, character_id, target_hex, &mut events)?,
            GameCommand::AttackTarget {
                character_id,
                target_id,
            } => {
                self.attack(room, player_id, character_id, target_id, &mut events)
                    .await?
            }
            GameCommand::CollectLoot { character_id, hex } => {
                self.collect_loot(room, player_id, character_id, hex, &mut events)?
            }
            GameCommand::EndTurn { character_id } => {
                self.end_turn(room, player_id, character_id, &mut events)?
            }
            GameCommand::PlaceSummon {
                character_id,
                summon,
                target_hex,
                max_range,
            } => self.place_summon(
                room,
                player_id,
                character_id,
                summon,
                target_hex,
                max_range,
                &mut events,
            )?,
            GameCommand::ExecuteRest {
                character_id,
                rest_type,
                card_to_lose,
            } => self.execute_rest(
                room,
                player_id,
                character_id,
                rest_type,
                card_to_lose,
                &mut events,
            )?,
        }

        if !room.is_completed() {
            self.update_objective_progress(room, &mut events);
            self.check_defeat(room, &mut events);
        }
        debug!(events = events.len(), "Command handled");
        Ok(events)
    }

    /// Run the activation of the AI-controlled figure whose turn it is.
    ///
    /// Failures inside the activation are logged and the turn advances
    /// anyway, so a broken plan can never stall the room.
    #[instrument(skip(self, room), fields(room_id = %room.id))]
    pub async fn run_scheduled_ai(&self, room: &mut RoomSession) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if !room.turn.ai_scheduled || room.phase != SessionPhase::ActiveTurn {
            return events;
        }
        room.turn.ai_scheduled = false;
        let Some(entry) = room.active_entry().cloned() else {
            return events;
        };

        if let Err(err) = self.activate(room, &entry, &mut events).await {
            error!(entity_id = %entry.entity_id, error = %err, "AI activation failed, advancing turn");
        }
        if room.is_completed() {
            return events;
        }

        if let Some(core) = room.roster.core_mut(entry.entity_id) {
            core.expire_turn_conditions();
        }
        room.turn.activated.insert(entry.entity_id);
        self.update_objective_progress(room, &mut events);
        if !self.check_defeat(room, &mut events) {
            self.advance_turn(room, &mut events);
        }
        events
    }

    /// Defeat is always checked; victory only when `check_primary` is set,
    /// which happens at round boundaries.
    pub fn check_scenario_completion(
        &self,
        room: &RoomSession,
        check_primary: bool,
    ) -> CompletionCheck {
        if room.roster.all_characters_out() {
            return CompletionCheck::defeat("All characters are exhausted");
        }
        if let Some(limit) = self.round_limit(room) {
            if room.round > limit {
                return CompletionCheck::defeat(format!("Round limit of {} exceeded", limit));
            }
        }

        let context = build_context(room.context_input());
        let objectives = &room.scenario.objectives;
        for condition in &objectives.failure_conditions {
            if self.evaluator.evaluate(condition, &context).complete {
                return CompletionCheck::defeat(format!(
                    "Failure condition met: {}",
                    label(condition)
                ));
            }
        }

        let primary = self.evaluator.evaluate(&objectives.primary, &context);
        if primary.failed {
            return CompletionCheck::defeat(format!(
                "Primary objective failed: {}",
                label(&objectives.primary)
            ));
        }
        if check_primary && primary.complete {
            return CompletionCheck::victory(format!(
                "Primary objective complete: {}",
                label(&objectives.primary)
            ));
        }
        CompletionCheck::ongoing()
    }

    // ========================================================================
    // Card selection
    // ========================================================================

    async fn select_cards(
        &self,
        room: &mut RoomSession,
        player_id: &str,
        character_id: EntityId,
        top_card_id: String,
        bottom_card_id: String,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        require_phase(
            room,
            SessionPhase::CardSelection,
            "Cards can only be selected during card selection",
        )?;
        let character = owned_character(room, player_id, character_id)?;
        if character.has_committed() {
            return Err(GameError::validation("Already committed this round"));
        }
        if top_card_id == bottom_card_id {
            return Err(GameError::validation("Top and bottom cards must differ"));
        }
        for card_id in [&top_card_id, &bottom_card_id] {
            if !character.hand.contains(card_id) {
                return Err(GameError::validation(format!("Card {} is not in hand", card_id)));
            }
        }
        let class_name = character.class_name.clone();

        let validation = self
            .content
            .validate_card_selection(&top_card_id, &bottom_card_id, &class_name)
            .await?;
        if !validation.valid {
            return Err(GameError::Validation(validation.errors.join("; ")));
        }
        let (top, bottom) = match (validation.top_card, validation.bottom_card) {
            (Some(top), Some(bottom)) => (top, bottom),
            _ => {
                return Err(GameError::Internal(
                    "Card validation returned no cards".into(),
                ))
            }
        };

        let stats = TurnStats::from_cards(&top, &bottom);
        let selection = CardSelection {
            top_card_id,
            bottom_card_id,
            initiative: top.initiative,
        };
        let character = room
            .roster
            .character_mut(character_id)
            .ok_or_else(|| GameError::not_found(format!("Character {}", character_id)))?;
        character.commit_selection(selection, stats);
        debug!(character_id = %character_id, initiative = top.initiative, "Cards selected");

        events.push(GameEvent::CardsSelected {
            player_id: player_id.to_string(),
            character_id,
            top_initiative: top.initiative,
            bottom_initiative: bottom.initiative,
        });

        if room.roster.characters_in_play().all(|c| c.has_committed()) {
            self.start_round(room, events);
        }
        Ok(())
    }

    fn execute_rest(
        &self,
        room: &mut RoomSession,
        player_id: &str,
        character_id: EntityId,
        rest_type: RestType,
        card_to_lose: Option<String>,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        require_phase(
            room,
            SessionPhase::CardSelection,
            "Rests are declared during card selection",
        )?;
        let character = owned_character(room, player_id, character_id)?;
        if character.has_committed() {
            return Err(GameError::validation("Already committed this round"));
        }
        if character.discard.len() < 2 {
            return Err(GameError::validation(
                "At least two discarded cards are needed to rest",
            ));
        }

        match rest_type {
            RestType::Short => {
                let character = room
                    .roster
                    .character_mut(character_id)
                    .ok_or_else(|| GameError::not_found(format!("Character {}", character_id)))?;
                let card_lost = character.short_rest(&mut room.rng);
                debug!(character_id = %character_id, card_lost = ?card_lost, "Short rest");
                events.push(GameEvent::RestCompleted {
                    character_id,
                    rest_type,
                    card_lost,
                    healed: 0,
                });
            }
            RestType::Long => {
                let card = card_to_lose
                    .ok_or_else(|| GameError::validation("A long rest needs a card to lose"))?;
                if !character.discard.contains(&card) {
                    return Err(GameError::validation(
                        "Card to lose must be in the discard pile",
                    ));
                }
                if let Some(character) = room.roster.character_mut(character_id) {
                    character.pending_long_rest = Some(card);
                }
                debug!(character_id = %character_id, "Long rest declared");
                if room.roster.characters_in_play().all(|c| c.has_committed()) {
                    self.start_round(room, events);
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Active turn commands
    // ========================================================================

    fn move_figure(
        &self,
        room: &mut RoomSession,
        player_id: &str,
        figure_id: EntityId,
        target_hex: AxialCoord,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        let kind = controlled_figure(room, player_id, figure_id)?;
        require_turn(room, figure_id)?;

        let (budget, can_fly) = match kind {
            EntityType::Character => {
                let character = owned_character(room, player_id, figure_id)?;
                if character.has_moved {
                    return Err(GameError::validation("Already moved this turn"));
                }
                if character.selected_cards.is_none() {
                    return Err(GameError::validation("Character is resting this round"));
                }
                (character.turn_stats.movement, false)
            }
            _ => {
                if room.turn.moved.contains(&figure_id) {
                    return Err(GameError::validation("Already moved this turn"));
                }
                let profile = profile_of(&room.roster, figure_id)
                    .ok_or_else(|| GameError::not_found(format!("Summon {}", figure_id)))?;
                (profile.movement, profile.can_fly)
            }
        };

        let core = room
            .roster
            .core(figure_id)
            .ok_or_else(|| GameError::not_found(format!("Figure {}", figure_id)))?;
        if !core.can_move() {
            return Err(GameError::validation(
                "Cannot move while immobilized or stunned",
            ));
        }
        let from = core.position;
        if from == target_hex {
            return Err(GameError::validation("Already standing on the target hex"));
        }

        let board = room.board();
        if !board.can_stand_on(&target_hex) {
            return Err(GameError::validation("Target hex is not a legal destination"));
        }
        let occupied = room.roster.occupied_hexes(Some(figure_id));
        if occupied.contains(&target_hex) {
            return Err(GameError::validation("Target hex is occupied"));
        }
        let path = self
            .pathfinder
            .find_path(from, target_hex, board, can_fly, &occupied)
            .ok_or_else(|| GameError::validation("No path to target hex"))?;
        let distance = board.path_cost(&path, can_fly);
        if distance > budget {
            return Err(GameError::validation(format!(
                "Target hex is out of movement range ({} > {})",
                distance, budget
            )));
        }

        if let Some(core) = room.roster.core_mut(figure_id) {
            core.position = target_hex;
        }
        match room.roster.character_mut(figure_id) {
            Some(character) => character.has_moved = true,
            None => {
                room.turn.moved.insert(figure_id);
            }
        }
        debug!(figure_id = %figure_id, %target_hex, distance, "Figure moved");

        events.push(GameEvent::CharacterMoved {
            character_id: figure_id,
            from,
            to: target_hex,
            path,
            distance,
        });
        Ok(())
    }

    async fn attack(
        &self,
        room: &mut RoomSession,
        player_id: &str,
        attacker_id: EntityId,
        target_id: EntityId,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        let kind = controlled_figure(room, player_id, attacker_id)?;
        require_turn(room, attacker_id)?;

        match kind {
            EntityType::Character => {
                let character = owned_character(room, player_id, attacker_id)?;
                if character.has_attacked {
                    return Err(GameError::validation("Already attacked this turn"));
                }
                if character.selected_cards.is_none() {
                    return Err(GameError::validation("Character is resting this round"));
                }
            }
            _ => {
                if room.turn.attacked.contains(&attacker_id) {
                    return Err(GameError::validation("Already attacked this turn"));
                }
            }
        }

        let attacker = room
            .roster
            .core(attacker_id)
            .ok_or_else(|| GameError::not_found(format!("Figure {}", attacker_id)))?;
        if !attacker.can_attack() {
            return Err(GameError::validation(
                "Cannot attack while disarmed or stunned",
            ));
        }
        let target = room
            .roster
            .core(target_id)
            .filter(|_| room.roster.is_living(target_id))
            .ok_or_else(|| GameError::not_found(format!("Target {}", target_id)))?;
        if !room.roster.are_enemies(attacker_id, target_id) {
            return Err(GameError::validation("Target is not an enemy"));
        }
        if target.has_condition(Condition::Invisible) {
            return Err(GameError::validation("Target is invisible"));
        }
        let range = profile_of(&room.roster, attacker_id).map_or(1, |p| p.range);
        let distance = attacker.position.distance(&target.position);
        if distance > range {
            return Err(GameError::validation(format!(
                "Target is out of range ({} > {})",
                distance, range
            )));
        }

        self.perform_attack(room, attacker_id, target_id, events)
            .await?;

        match room.roster.character_mut(attacker_id) {
            Some(character) => character.has_attacked = true,
            None => {
                room.turn.attacked.insert(attacker_id);
            }
        }
        // Retaliate can end the attacker's turn for good
        if !room.is_completed() && !room.roster.is_living(attacker_id) {
            self.advance_turn(room, events);
        }
        Ok(())
    }

    fn collect_loot(
        &self,
        room: &mut RoomSession,
        player_id: &str,
        character_id: EntityId,
        hex: AxialCoord,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        let position = owned_character(room, player_id, character_id)?.core.position;
        require_turn(room, character_id)?;
        if position.distance(&hex) > self.settings.loot_collect_range {
            return Err(GameError::validation("Loot is out of reach"));
        }
        if room.loot_index_at(&hex).is_none() && room.treasure_index_at(&hex).is_none() {
            return Err(GameError::not_found(format!("Loot at {}", hex)));
        }
        self.collect_at(room, character_id, hex, events);
        Ok(())
    }

    fn end_turn(
        &self,
        room: &mut RoomSession,
        player_id: &str,
        figure_id: EntityId,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        let kind = controlled_figure(room, player_id, figure_id)?;
        require_turn(room, figure_id)?;

        if kind == EntityType::Character {
            let position = owned_character(room, player_id, figure_id)?.core.position;
            self.collect_at(room, figure_id, position, events);

            let heal = self.settings.long_rest_heal;
            if let Some(character) = room.roster.character_mut(figure_id) {
                if let Some((card_lost, healed)) = character.resolve_long_rest(heal) {
                    events.push(GameEvent::RestCompleted {
                        character_id: figure_id,
                        rest_type: RestType::Long,
                        card_lost: Some(card_lost),
                        healed,
                    });
                }
                character.discard_played_cards();
            }
        }

        if let Some(core) = room.roster.core_mut(figure_id) {
            core.expire_turn_conditions();
        }
        room.turn.activated.insert(figure_id);
        debug!(figure_id = %figure_id, "Turn ended");
        self.advance_turn(room, events);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn place_summon(
        &self,
        room: &mut RoomSession,
        player_id: &str,
        character_id: EntityId,
        definition: SummonDefinition,
        target_hex: AxialCoord,
        max_range: Option<u32>,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        let position = owned_character(room, player_id, character_id)?.core.position;
        require_turn(room, character_id)?;
        if definition.health <= 0 {
            return Err(GameError::validation("Summon must have positive health"));
        }
        let range = max_range.unwrap_or(self.settings.max_summon_range);
        if position.distance(&target_hex) > range {
            return Err(GameError::validation(format!(
                "Target hex is beyond summon range {}",
                range
            )));
        }
        if !room.board().can_stand_on(&target_hex) {
            return Err(GameError::validation("Target hex is not a legal destination"));
        }
        if room.roster.is_occupied(&target_hex) {
            return Err(GameError::validation("Target hex is occupied"));
        }

        let summon_id = room.next_entity_id();
        let name = definition.name.clone();
        room.roster
            .summons
            .push(Summon::new(summon_id, definition, Some(character_id), target_hex));
        info!(summon_id = %summon_id, owner_id = %character_id, "Summon placed");

        events.push(GameEvent::SummonPlaced {
            summon_id,
            owner_id: character_id,
            name,
            position: target_hex,
        });
        Ok(())
    }

    // ========================================================================
    // Combat
    // ========================================================================

    async fn perform_attack(
        &self,
        room: &mut RoomSession,
        attacker_id: EntityId,
        target_id: EntityId,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        let profile = profile_of(&room.roster, attacker_id)
            .ok_or_else(|| GameError::not_found(format!("Figure {}", attacker_id)))?;
        let attacker_type = room
            .roster
            .entity_type(attacker_id)
            .ok_or_else(|| GameError::not_found(format!("Figure {}", attacker_id)))?;
        let target_type = room
            .roster
            .entity_type(target_id)
            .ok_or_else(|| GameError::not_found(format!("Target {}", target_id)))?;

        let attack_bonus = match attacker_type {
            EntityType::Character => self.equipped_bonuses(attacker_id).await.attack_bonus,
            _ => 0,
        };
        let defense_bonus = match target_type {
            EntityType::Character => self.equipped_bonuses(target_id).await.defense_bonus,
            _ => 0,
        };
        let deck_owner = match attacker_type {
            EntityType::Character => DeckOwner::Character(attacker_id),
            EntityType::Monster => DeckOwner::Monsters,
            EntityType::Summon => match room.roster.summon(attacker_id).and_then(|s| s.owner_id) {
                Some(owner) => DeckOwner::Character(owner),
                None => DeckOwner::Allies,
            },
        };

        let occupied = room.roster.occupied_hexes(Some(target_id));
        let ctx = AttackContext {
            base_attack: profile.attack + attack_bonus,
            action_modifiers: &profile.attack_modifiers,
            defense_bonus,
            board: &room.scenario.board,
            occupied: &occupied,
        };
        let (attacker, target) = room
            .roster
            .pair_mut(attacker_id, target_id)
            .ok_or_else(|| GameError::Internal("Attacker and target must differ".into()))?;
        let deck = room.decks.deck_mut(deck_owner, &mut room.rng);
        let outcome = resolve_attack(attacker, target, deck, &mut room.rng, &mut room.elements, &ctx);
        let target_health = target.current_health;

        events.push(GameEvent::AttackResolved {
            attacker_id,
            target_id,
            damage: outcome.damage,
            modifier: outcome.modifier,
            target_dead: outcome.target_dead,
            target_health,
            retaliate_damage: outcome.retaliate_damage,
            forced_to: outcome.forced_path.last().copied(),
            conditions_applied: outcome.conditions_applied.clone(),
        });
        if !outcome.consumed_elements.is_empty() || !outcome.infused_elements.is_empty() {
            events.push(GameEvent::ElementalStateUpdated {
                elements: room.elements,
            });
        }

        let dealt = outcome.damage.max(0) as u32;
        if let Some(character) = room.roster.character_mut(attacker_id) {
            character.damage_dealt += dealt;
            character.experience += outcome.experience;
        }
        if target_type == EntityType::Character {
            room.stats.total_damage_taken += dealt;
        }
        if attacker_type == EntityType::Character {
            room.stats.total_damage_taken += outcome.retaliate_damage.max(0) as u32;
        }

        if outcome.target_dead {
            self.handle_defeat_of(room, target_id, Some(attacker_id), events);
        }
        if outcome.attacker_dead {
            self.handle_defeat_of(room, attacker_id, None, events);
        }
        room.stats.refresh_from(&room.roster);
        room.sync_turn_order();
        Ok(())
    }

    async fn equipped_bonuses(&self, character_id: EntityId) -> EquippedBonuses {
        match self.inventory.get_equipped_bonuses(character_id).await {
            Ok(bonuses) => bonuses,
            Err(err) => {
                warn!(character_id = %character_id, error = %err, "Inventory lookup failed, using no bonuses");
                EquippedBonuses::default()
            }
        }
    }

    /// Loot for dead monsters, exhaustion for dead characters
    fn handle_defeat_of(
        &self,
        room: &mut RoomSession,
        figure_id: EntityId,
        killer: Option<EntityId>,
        events: &mut Vec<GameEvent>,
    ) {
        match room.roster.entity_type(figure_id) {
            Some(EntityType::Monster) => {
                if let Some(character) = killer.and_then(|id| room.roster.character_mut(id)) {
                    character.monsters_killed += 1;
                }
                let Some(position) = room.roster.core(figure_id).map(|core| core.position) else {
                    return;
                };
                let gold = self.settings.gold_per_loot_token(room.level());
                let token = LootToken {
                    id: LootId::from_rng(&mut room.rng),
                    position,
                    gold,
                };
                info!(monster_id = %figure_id, %position, gold, "Monster killed");
                events.push(GameEvent::LootSpawned {
                    loot_id: token.id,
                    position,
                    gold,
                });
                room.loot.push(token);
            }
            Some(EntityType::Character) => {
                self.exhaust_character(room, figure_id, ExhaustionReason::Damage, events)
            }
            Some(EntityType::Summon) | None => {
                debug!(figure_id = %figure_id, "Summon defeated")
            }
        }
    }

    fn exhaust_character(
        &self,
        room: &mut RoomSession,
        character_id: EntityId,
        reason: ExhaustionReason,
        events: &mut Vec<GameEvent>,
    ) {
        let Some(character) = room.roster.character_mut(character_id) else {
            return;
        };
        if character.is_exhausted {
            return;
        }
        character.is_exhausted = true;
        let dismissed = room.roster.dismiss_summons_of(character_id);
        room.stats.refresh_from(&room.roster);
        room.sync_turn_order();
        info!(
            character_id = %character_id,
            ?reason,
            dismissed_summons = dismissed.len(),
            "Character exhausted"
        );
        events.push(GameEvent::CharacterExhausted {
            character_id,
            reason,
        });
        self.check_defeat(room, events);
    }

    /// Pick up every loot token and uncollected treasure on the hex
    fn collect_at(
        &self,
        room: &mut RoomSession,
        character_id: EntityId,
        hex: AxialCoord,
        events: &mut Vec<GameEvent>,
    ) -> bool {
        let mut gold = 0;
        let mut tokens = 0;
        while let Some(index) = room.loot_index_at(&hex) {
            let token = room.loot.remove(index);
            gold += token.gold;
            tokens += 1;
            events.push(GameEvent::LootCollected {
                character_id,
                position: hex,
                gold: token.gold,
                treasure_id: None,
            });
        }
        let mut treasure_found = false;
        if let Some(index) = room.treasure_index_at(&hex) {
            let treasure = &mut room.treasures[index];
            treasure.collected_by = Some(character_id);
            gold += treasure.gold;
            treasure_found = true;
            events.push(GameEvent::LootCollected {
                character_id,
                position: hex,
                gold: treasure.gold,
                treasure_id: Some(treasure.id.clone()),
            });
        }

        if tokens == 0 && !treasure_found {
            return false;
        }
        if let Some(character) = room.roster.character_mut(character_id) {
            character.gold += gold;
            character.loot_collected += tokens;
        }
        room.stats.refresh_from(&room.roster);
        debug!(character_id = %character_id, %hex, gold, tokens, "Loot collected");
        true
    }

    // ========================================================================
    // AI activation
    // ========================================================================

    async fn activate(
        &self,
        room: &mut RoomSession,
        entry: &TurnOrderEntry,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        let id = entry.entity_id;
        let board = &room.scenario.board;
        let plan = match entry.entity_type {
            EntityType::Monster => {
                let monster = room
                    .roster
                    .monster(id)
                    .ok_or_else(|| GameError::not_found(format!("Monster {}", id)))?;
                plan_monster_turn(monster, &room.roster, board, self.pathfinder.as_ref())
            }
            EntityType::Summon => {
                let summon = room
                    .roster
                    .summon(id)
                    .ok_or_else(|| GameError::not_found(format!("Summon {}", id)))?;
                plan_summon_turn(summon, &room.roster, board, self.pathfinder.as_ref())
            }
            EntityType::Character => {
                return Err(GameError::Internal(format!(
                    "Character {} is not AI-controlled",
                    id
                )))
            }
        };

        let (focus_target, movement, attack) = match plan {
            Some(plan) => (Some(plan.target_id), plan.movement, plan.attack),
            None => (None, None, false),
        };
        let path = match movement {
            Some(movement) => {
                if let Some(core) = room.roster.core_mut(id) {
                    core.position = movement.destination;
                }
                room.turn.moved.insert(id);
                movement.path
            }
            None => Vec::new(),
        };
        debug!(entity_id = %id, focus = ?focus_target, steps = path.len(), attack, "AI activated");

        events.push(match entry.entity_type {
            EntityType::Monster => GameEvent::MonsterActivated {
                monster_id: id,
                focus_target,
                path,
                attacked: attack,
            },
            _ => GameEvent::SummonActivated {
                summon_id: id,
                focus_target,
                path,
                attacked: attack,
            },
        });

        if let (true, Some(target_id)) = (attack, focus_target) {
            self.perform_attack(room, id, target_id, events).await?;
            room.turn.attacked.insert(id);
        }
        Ok(())
    }

    // ========================================================================
    // Round lifecycle
    // ========================================================================

    fn enter_card_selection(&self, room: &mut RoomSession, events: &mut Vec<GameEvent>) {
        room.phase = SessionPhase::CardSelection;
        room.turn.active_index = None;
        room.turn.ai_scheduled = false;
        room.draw_monster_initiatives(
            self.settings.monster_initiative_min,
            self.settings.monster_initiative_max,
        );

        let stuck: Vec<EntityId> = room
            .roster
            .characters_in_play()
            .filter(|c| !c.can_play_round())
            .map(|c| c.core.id)
            .collect();
        for character_id in stuck {
            if room.is_completed() {
                return;
            }
            self.exhaust_character(room, character_id, ExhaustionReason::NoCards, events);
        }
        if !room.is_completed() {
            self.check_defeat(room, events);
        }
        debug!(round = room.round, "Card selection opened");
    }

    fn start_round(&self, room: &mut RoomSession, events: &mut Vec<GameEvent>) {
        let rules = InitiativeRules::from(&self.settings);
        let order = turn_order::build_order(
            &room.roster.characters,
            &room.roster.monsters,
            &room.roster.summons,
            &room.monster_initiatives,
            &rules,
        );
        for character in room.roster.characters.iter_mut() {
            character.reset_turn_flags();
        }
        room.turn.clear_acted();
        room.turn.order = order;
        room.turn.active_index = None;
        room.turn.ai_scheduled = false;
        room.phase = SessionPhase::ActiveTurn;

        info!(round = room.round, entries = room.turn.order.len(), "Round started");
        events.push(GameEvent::RoundStarted {
            round_number: room.round,
            turn_order: room.turn.order.clone(),
        });

        match turn_order::first_living_index(&room.turn.order) {
            Some(index) => {
                if !self.begin_turn(room, index, events) {
                    self.advance_turn(room, events);
                }
            }
            None => {
                warn!(round = room.round, "Round started with nobody able to act");
                self.complete_round(room, events);
            }
        }
    }

    /// Make `index` the active turn; false when the figure died on the spot
    fn begin_turn(&self, room: &mut RoomSession, index: usize, events: &mut Vec<GameEvent>) -> bool {
        room.turn.active_index = Some(index);
        room.turn.ai_scheduled = false;
        let Some(entry) = room.turn.order.get(index).cloned() else {
            return false;
        };
        events.push(GameEvent::TurnStarted {
            entity_id: entry.entity_id,
            entity_type: entry.entity_type,
            turn_index: index,
        });

        let wounded = room
            .roster
            .core(entry.entity_id)
            .map_or(false, |core| core.has_condition(Condition::Wound));
        if wounded {
            let died = room
                .roster
                .core_mut(entry.entity_id)
                .map_or(false, |core| core.apply_damage(1));
            if entry.entity_type == EntityType::Character {
                room.stats.total_damage_taken += 1;
            }
            debug!(entity_id = %entry.entity_id, died, "Wound damage");
            if died {
                self.handle_defeat_of(room, entry.entity_id, None, events);
                room.stats.refresh_from(&room.roster);
                room.sync_turn_order();
                return false;
            }
        }

        room.turn.ai_scheduled = match entry.entity_type {
            EntityType::Character => false,
            EntityType::Monster => true,
            EntityType::Summon => !room
                .roster
                .summon(entry.entity_id)
                .map_or(false, |s| s.player_controlled),
        };
        debug!(
            entity_id = %entry.entity_id,
            entity_type = %entry.entity_type,
            ai = room.turn.ai_scheduled,
            "Turn started"
        );
        true
    }

    fn advance_turn(&self, room: &mut RoomSession, events: &mut Vec<GameEvent>) {
        loop {
            if room.is_completed() {
                return;
            }
            room.sync_turn_order();
            let current = room.turn.active_index.unwrap_or(0);
            match turn_order::next_living_index(current, &room.turn.order) {
                Ok(next) if next.round_complete => {
                    self.complete_round(room, events);
                    return;
                }
                Ok(next) => {
                    if self.begin_turn(room, next.index, events) {
                        return;
                    }
                }
                Err(err) => {
                    warn!(round = room.round, error = %err, "Turn order exhausted");
                    self.complete_round(room, events);
                    return;
                }
            }
        }
    }

    /// Victory is only ever decided here, with the finished round's number
    fn complete_round(&self, room: &mut RoomSession, events: &mut Vec<GameEvent>) {
        let completed = room.round;
        for character in room.roster.characters.iter_mut() {
            character.clear_round_state();
        }
        room.turn.active_index = None;
        room.turn.ai_scheduled = false;
        room.turn.clear_acted();
        room.stats.rounds_completed += 1;
        room.stats.refresh_from(&room.roster);
        events.push(GameEvent::RoundCompleted {
            round_number: completed,
        });
        info!(round = completed, "Round completed");

        self.update_objective_progress(room, events);
        let check = self.check_scenario_completion(room, true);
        if check.complete {
            self.finalize(room, check, events);
            return;
        }

        room.elements = elemental::decay(room.elements);
        events.push(GameEvent::ElementalStateUpdated {
            elements: room.elements,
        });
        room.round += 1;
        self.enter_card_selection(room, events);
    }

    // ========================================================================
    // Objectives and completion
    // ========================================================================

    fn update_objective_progress(&self, room: &mut RoomSession, events: &mut Vec<GameEvent>) {
        let context = build_context(room.context_input());
        for definition in room.scenario.objectives.all().filter(|d| d.track_progress) {
            let result = self.evaluator.evaluate(definition, &context);
            if let Some(err) = &result.error {
                debug!(objective = %definition.id, error = %err, "Objective not evaluable");
                continue;
            }
            let milestones = if definition.milestones.is_empty() {
                &self.settings.default_milestones
            } else {
                &definition.milestones
            };
            let entry = room
                .objective_progress
                .entry(definition.id.clone())
                .or_default();
            let before = (entry.current, entry.target);
            let crossed = record_progress(entry, &result, milestones);
            if crossed.is_empty() && before == (entry.current, entry.target) {
                continue;
            }
            events.push(GameEvent::ObjectiveProgress {
                objective_id: definition.id.clone(),
                current: entry.current,
                target: entry.target,
                percentage: entry.percent,
                milestone: crossed.last().copied(),
            });
        }
    }

    /// Finalize on defeat; returns whether the scenario is over
    fn check_defeat(&self, room: &mut RoomSession, events: &mut Vec<GameEvent>) -> bool {
        if room.is_completed() {
            return true;
        }
        let check = self.check_scenario_completion(room, false);
        if check.complete {
            self.finalize(room, check, events);
            return true;
        }
        false
    }

    fn round_limit(&self, room: &RoomSession) -> Option<u32> {
        let configured = (self.settings.max_rounds > 0).then_some(self.settings.max_rounds);
        match (room.scenario.round_limit, configured) {
            (Some(scenario), Some(configured)) => Some(scenario.min(configured)),
            (scenario, configured) => scenario.or(configured),
        }
    }

    fn finalize(&self, room: &mut RoomSession, check: CompletionCheck, events: &mut Vec<GameEvent>) {
        if room.is_completed() {
            return;
        }
        let victory = check.victory;
        let reason = check.reason.unwrap_or_default();

        if victory {
            let context = build_context(room.context_input());
            let objectives = &room.scenario.objectives;
            let rewards: Vec<_> = std::iter::once(&objectives.primary)
                .chain(objectives.secondary.iter())
                .filter(|d| self.evaluator.evaluate(d, &context).complete)
                .map(|d| d.rewards.clone())
                .collect();
            for reward in rewards {
                for character in room.roster.characters.iter_mut() {
                    character.experience += reward.experience;
                    character.gold += reward.gold;
                }
            }
        }
        room.stats.refresh_from(&room.roster);

        room.phase = SessionPhase::Completed;
        room.turn.active_index = None;
        room.turn.ai_scheduled = false;
        room.outcome = Some(ScenarioOutcome {
            victory,
            reason: reason.clone(),
            round: room.round,
        });

        let player_stats: Vec<PlayerStat> = room.roster.characters.iter().map(player_stat).collect();
        info!(victory, reason = %reason, round = room.round, "Scenario completed");
        events.push(GameEvent::ScenarioCompleted {
            victory,
            reason,
            experience: player_stats.iter().map(|p| p.experience).sum(),
            gold: player_stats.iter().map(|p| p.gold).sum(),
            loot: room.stats.total_loot_collected,
            player_stats: player_stats.clone(),
        });

        self.save_result(GameResult::from_session(room, player_stats));
    }

    /// Fire-and-forget; a failed save never touches the in-memory room
    fn save_result(&self, result: GameResult) {
        let results = Arc::clone(&self.results);
        tokio::spawn(async move {
            match results.save_game_result(&result).await {
                Ok(()) => debug!(room_id = %result.room_id, "Game result saved"),
                Err(err) => {
                    error!(room_id = %result.room_id, error = %err, "Failed to save game result")
                }
            }
        });
    }
}

// ============================================================================
// Validation helpers
// ============================================================================

fn require_phase(room: &RoomSession, phase: SessionPhase, message: &str) -> Result<(), GameError> {
    if room.phase != phase {
        return Err(GameError::validation(message));
    }
    Ok(())
}

fn require_turn(room: &RoomSession, figure_id: EntityId) -> Result<(), GameError> {
    require_phase(room, SessionPhase::ActiveTurn, "No turn is in progress")?;
    if !room.is_active_entity(figure_id) {
        return Err(GameError::validation("It is not this figure's turn"));
    }
    Ok(())
}

fn owned_character<'a>(
    room: &'a RoomSession,
    player_id: &str,
    character_id: EntityId,
) -> Result<&'a Character, GameError> {
    let character = room
        .roster
        .character(character_id)
        .ok_or_else(|| GameError::not_found(format!("Character {}", character_id)))?;
    if character.user_id != player_id {
        return Err(GameError::validation("Character is controlled by another player"));
    }
    if !character.is_in_play() {
        return Err(GameError::validation("Character is exhausted"));
    }
    Ok(character)
}

/// A character of the player, or a player-controlled summon they own
fn controlled_figure(
    room: &RoomSession,
    player_id: &str,
    figure_id: EntityId,
) -> Result<EntityType, GameError> {
    if room.roster.character(figure_id).is_some() {
        owned_character(room, player_id, figure_id)?;
        return Ok(EntityType::Character);
    }
    let summon = room
        .roster
        .summon(figure_id)
        .ok_or_else(|| GameError::not_found(format!("Figure {}", figure_id)))?;
    let owner = summon.owner_id.and_then(|owner| room.roster.character(owner));
    match owner {
        Some(owner) if summon.player_controlled && owner.user_id == player_id => {
            if summon.core.is_dead {
                return Err(GameError::validation("Summon is dead"));
            }
            Ok(EntityType::Summon)
        }
        _ => Err(GameError::validation("Summon is not controlled by this player")),
    }
}

fn profile_of(roster: &Roster, id: EntityId) -> Option<CombatProfile> {
    if let Some(character) = roster.character(id) {
        return Some(character.profile());
    }
    if let Some(monster) = roster.monster(id) {
        return Some(monster.profile());
    }
    roster.summon(id).map(|summon| summon.profile())
}

fn label(definition: &ObjectiveDefinition) -> &str {
    if definition.description.is_empty() {
        &definition.id
    } else {
        &definition.description
    }
}

fn player_stat(character: &Character) -> PlayerStat {
    PlayerStat {
        player_id: character.user_id.clone(),
        character_id: character.core.id,
        character_name: character.core.name.clone(),
        class_name: character.class_name.clone(),
        experience: character.experience,
        gold: character.gold,
        loot_collected: character.loot_collected,
        damage_dealt: character.damage_dealt,
        monsters_killed: character.monsters_killed,
        exhausted: character.is_exhausted,
    }
}
