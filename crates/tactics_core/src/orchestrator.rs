//! Turn and command orchestration.
//!
//! The [`Orchestrator`] owns the [`Battle`] and is the single entry point for
//! input, menu answers, automated decisions and presentation signals. It
//! serializes everything into one flow: at most one actor performs at a
//! time, at most one payload is live, continuations run strictly in
//! registration order after their command's effect, and a turn is handed off
//! exactly once when the active side's roster empties.
//!
//! ## Tick model
//!
//! Each [`Orchestrator::tick`] call:
//! 1. processes at most one input (only while idle),
//! 2. advances the in-flight replay or presentation delay by one tick,
//! 3. drains the continuation queue,
//! 4. polls the active side's delegate if it drives its own turn.

use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::action_state::ActionKind;
use crate::actor::{ActorId, SideId};
use crate::ai::AdvancePolicy;
use crate::battle::Battle;
use crate::command::{Command, CommandKind, CommandPayload, Continuation};
use crate::config::{Controller, MatchConfig, PresentationMode};
use crate::decision::{Decision, DecisionDelegate, DecisionRequest, MenuChoice, MenuDelegate};
use crate::error::Result;
use crate::events::{ActionSpace, BattleEvent, FocusKind};
use crate::grid::{CellCoord, Direction};
use crate::path::PathSession;
use crate::replay::{PathReplay, ReplayTick, VisualPose};
use crate::turn::Handoff;

/// Abstract button press from the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    /// Accept.
    Confirm,
    /// Back out.
    Reverse,
    /// Open the menu.
    OpenMenu,
    /// Turn in place; positive is clockwise.
    Rotate(i8),
}

/// One tick's worth of pre-debounced input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct InputEvent {
    /// Cardinal direction, if any.
    pub direction: Option<Direction>,
    /// Button, if any.
    pub button: Option<Button>,
}

impl InputEvent {
    /// Direction only.
    #[must_use]
    pub const fn direction(direction: Direction) -> Self {
        Self {
            direction: Some(direction),
            button: None,
        }
    }

    /// Button only.
    #[must_use]
    pub const fn button(button: Button) -> Self {
        Self {
            direction: None,
            button: Some(button),
        }
    }
}

/// Who owns navigation input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Focus {
    /// Free cursor.
    Neutral,
    /// A menu owns navigation.
    Menu {
        /// Open sub-menus; zero closes the menu.
        depth: u32,
        /// Actor whose decision the menu will answer.
        pending: Option<ActorId>,
    },
    /// An actor is building a path.
    PathConstruction,
}

impl Focus {
    /// Coarse kind for events.
    #[must_use]
    pub const fn kind(self) -> FocusKind {
        match self {
            Self::Neutral => FocusKind::Neutral,
            Self::Menu { .. } => FocusKind::Menu,
            Self::PathConstruction => FocusKind::PathConstruction,
        }
    }
}

/// What the orchestrator is busy with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Accepting input and commands.
    Idle,
    /// Playing back a committed path.
    Replaying,
    /// Waiting for an attack presentation.
    AwaitingAttack,
    /// Input-locked turn handoff.
    PassingTurn,
    /// Nothing more will happen.
    MatchOver,
}

#[derive(Debug, Clone)]
enum Activity {
    Idle,
    Replaying {
        replay: PathReplay,
        payload: CommandPayload,
    },
    AwaitingAttack {
        payload: CommandPayload,
        remaining: u32,
    },
    PassingTurn {
        remaining: u32,
    },
    MatchOver {
        winner: Option<SideId>,
    },
}

impl Activity {
    const fn kind(&self) -> ActivityKind {
        match self {
            Self::Idle => ActivityKind::Idle,
            Self::Replaying { .. } => ActivityKind::Replaying,
            Self::AwaitingAttack { .. } => ActivityKind::AwaitingAttack,
            Self::PassingTurn { .. } => ActivityKind::PassingTurn,
            Self::MatchOver { .. } => ActivityKind::MatchOver,
        }
    }
}

#[derive(Debug, Clone)]
enum Queued {
    Continuation { actor: ActorId, continuation: Continuation },
    EndOfTurn { actor: ActorId },
}

/// Authoritative flow controller for one match.
pub struct Orchestrator {
    battle: Battle,
    delegates: Vec<Box<dyn DecisionDelegate>>,
    focus: Focus,
    activity: Activity,
    cursor: CellCoord,
    selection: Option<ActorId>,
    shown: Option<(ActorId, Vec<ActionSpace>)>,
    session: Option<PathSession>,
    queue: VecDeque<Queued>,
    draining: bool,
    events: Vec<BattleEvent>,
    tick: u64,
}

impl Orchestrator {
    /// Take over a battle. Sides without a delegate get a [`MenuDelegate`].
    ///
    /// The first side's turn starts immediately, beginning with its banner.
    #[must_use]
    pub fn new(battle: Battle, mut delegates: Vec<Box<dyn DecisionDelegate>>) -> Self {
        let sides = battle.turns().sides().len();
        while delegates.len() < sides {
            delegates.push(Box::new(MenuDelegate));
        }
        let mut orchestrator = Self {
            battle,
            delegates,
            focus: Focus::Neutral,
            activity: Activity::Idle,
            cursor: CellCoord::new(0, 0),
            selection: None,
            shown: None,
            session: None,
            queue: VecDeque::new(),
            draining: false,
            events: Vec::new(),
            tick: 0,
        };
        let first = orchestrator.battle.turns().active_side();
        orchestrator.start_side(first);
        orchestrator
    }

    /// Build the battle from `config` with delegates per side controller.
    ///
    /// # Errors
    /// Returns any error from [`Battle::from_config`].
    pub fn from_config(config: &MatchConfig) -> Result<Self> {
        let battle = Battle::from_config(config)?;
        let delegates = config
            .sides
            .iter()
            .map(|side| -> Box<dyn DecisionDelegate> {
                match side.controller {
                    Controller::Human => Box::new(MenuDelegate),
                    Controller::Auto => Box::new(AdvancePolicy),
                }
            })
            .collect();
        Ok(Self::new(battle, delegates))
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The world context.
    #[must_use]
    pub const fn battle(&self) -> &Battle {
        &self.battle
    }

    /// Current focus.
    #[must_use]
    pub const fn focus(&self) -> Focus {
        self.focus
    }

    /// Current activity.
    #[must_use]
    pub const fn activity(&self) -> ActivityKind {
        self.activity.kind()
    }

    /// Cursor cell.
    #[must_use]
    pub const fn cursor(&self) -> CellCoord {
        self.cursor
    }

    /// Selected actor.
    #[must_use]
    pub const fn selection(&self) -> Option<ActorId> {
        self.selection
    }

    /// Currently highlighted action spaces and their owner.
    #[must_use]
    pub fn shown_spaces(&self) -> Option<(ActorId, &[ActionSpace])> {
        self.shown.as_ref().map(|(actor, spaces)| (*actor, spaces.as_slice()))
    }

    /// Open path construction session.
    #[must_use]
    pub const fn session(&self) -> Option<&PathSession> {
        self.session.as_ref()
    }

    /// Ticks processed so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.tick
    }

    /// True while input is ignored.
    #[must_use]
    pub const fn is_input_locked(&self) -> bool {
        !matches!(self.activity, Activity::Idle)
    }

    /// `Some(winner)` once the match is over.
    #[must_use]
    pub const fn outcome(&self) -> Option<Option<SideId>> {
        match self.activity {
            Activity::MatchOver { winner } => Some(winner),
            _ => None,
        }
    }

    /// True if a payload is in flight.
    #[must_use]
    pub const fn has_live_payload(&self) -> bool {
        matches!(
            self.activity,
            Activity::Replaying { .. } | Activity::AwaitingAttack { .. }
        )
    }

    /// Take all events raised since the last drain.
    pub fn drain_events(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.events)
    }

    /// Hash of all gameplay and flow state, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        self.battle.hash_state(&mut hasher);
        self.focus.hash(&mut hasher);
        self.activity.kind().hash(&mut hasher);
        self.cursor.hash(&mut hasher);
        self.selection.hash(&mut hasher);
        hasher.finish()
    }

    // ------------------------------------------------------------------
    // Frame loop entry points
    // ------------------------------------------------------------------

    /// Advance one tick, processing at most one input.
    pub fn tick(&mut self, input: Option<InputEvent>) {
        self.tick += 1;
        match self.activity {
            Activity::Idle => {
                if let Some(input) = input {
                    self.handle_input(input);
                }
            }
            Activity::Replaying { .. } => self.advance_replay(),
            Activity::AwaitingAttack { .. } | Activity::PassingTurn { .. } => self.advance_delay(),
            Activity::MatchOver { .. } => {}
        }
        self.drain_queue();
        self.poll_automated();
        self.drain_queue();
    }

    /// External signal that an attack presentation or turn banner finished.
    ///
    /// Returns `false` if nothing was waiting on presentation.
    pub fn presentation_complete(&mut self) -> bool {
        if !matches!(
            self.activity,
            Activity::AwaitingAttack { .. } | Activity::PassingTurn { .. }
        ) {
            return false;
        }
        self.finish_presentation();
        self.drain_queue();
        true
    }

    /// Menu answer for the pending decision.
    ///
    /// Returns `false` if no decision is pending or the choice is not
    /// currently available.
    pub fn choose(&mut self, choice: MenuChoice) -> bool {
        let Focus::Menu {
            pending: Some(actor),
            ..
        } = self.focus
        else {
            return false;
        };
        if let MenuChoice::Action(kind) = choice {
            if !self.battle.available_actions(actor).contains(&kind) {
                tracing::debug!(%actor, ?kind, "menu choice not available");
                return false;
            }
        }
        let Some(cell) = self.battle.actor(actor).map(|actor| actor.pose.cell) else {
            return false;
        };
        self.set_focus(Focus::Neutral);
        self.parse_command(CommandPayload::new(actor, choice.command()).with_target(cell))
    }

    // ------------------------------------------------------------------
    // Command dispatch
    // ------------------------------------------------------------------

    /// Dispatch a payload, then run whatever completed.
    ///
    /// Rejected as a no-op (returning `false`) during a handoff or after the
    /// match, while another payload is live, while a different actor is
    /// performing, or when the command does not apply to the actor.
    pub fn parse_command(&mut self, payload: CommandPayload) -> bool {
        let accepted = self.dispatch(payload);
        self.drain_queue();
        accepted
    }

    fn dispatch(&mut self, payload: CommandPayload) -> bool {
        if !matches!(self.activity, Activity::Idle) {
            tracing::debug!(actor = %payload.actor, command = ?payload.kind(), activity = ?self.activity.kind(), "dispatch rejected: busy");
            return false;
        }
        if let Some(busy) = self.battle.performing_actor() {
            if busy != payload.actor {
                tracing::debug!(actor = %payload.actor, %busy, "dispatch rejected: another actor is performing");
                return false;
            }
        }
        if let Some(session) = &self.session {
            let allowed = session.actor() == payload.actor
                && matches!(payload.command, Command::Move { .. } | Command::Cancel | Command::Revert);
            if !allowed {
                tracing::debug!(actor = %payload.actor, command = ?payload.kind(), "dispatch rejected: path session open");
                return false;
            }
        }
        let Some(actor) = self.battle.actor(payload.actor).filter(|actor| actor.is_alive()) else {
            return false;
        };
        let id = actor.id;
        let on_active_side = actor.side == self.battle.turns().active_side();
        let pose = actor.pose;
        let actions = actor.actions;
        tracing::debug!(actor = %id, command = ?payload.kind(), "dispatch");

        match &payload.command {
            Command::GenerateMoveSpaces => {
                let spaces = self.battle.move_action_spaces(id, !on_active_side);
                self.show_spaces(id, spaces);
                self.complete(payload);
            }
            Command::InitializeMove => {
                if !on_active_side || actions.performed(ActionKind::Move) || actions.is_spent() {
                    return false;
                }
                let Some(actor) = self.battle.actor(id) else {
                    return false;
                };
                self.session = Some(PathSession::begin(actor));
                self.battle.begin_action(id, ActionKind::Move);
                let spaces = self.battle.move_action_spaces(id, false);
                self.show_spaces(id, spaces);
                self.set_focus(Focus::PathConstruction);
                self.complete(payload);
            }
            Command::Move { path } => {
                if !on_active_side || actions.performed(ActionKind::Move) || path.origin() != pose {
                    return false;
                }
                if !self
                    .battle
                    .actor(id)
                    .is_some_and(|actor| path.is_legal_for(actor, self.battle.grid()))
                {
                    tracing::debug!(actor = %id, steps = path.len(), "dispatch rejected: illegal path");
                    return false;
                }
                if let Some(session) = self.session.take() {
                    session.abort();
                }
                if self.focus == Focus::PathConstruction {
                    self.set_focus(Focus::Neutral);
                }
                self.clear_spaces();
                self.battle.begin_action(id, ActionKind::Move);
                if path.is_empty() {
                    self.finish_move(payload);
                } else {
                    let replay = PathReplay::new(id, path.clone(), self.battle.timing().step_ticks);
                    self.activity = Activity::Replaying { replay, payload };
                }
            }
            Command::GenerateAttackSpaces => {
                let spaces = self.battle.attack_spaces(id, true);
                self.show_spaces(id, spaces);
                self.complete(payload);
            }
            Command::InitializeAttack => {
                if !on_active_side || !self.battle.available_actions(id).contains(&ActionKind::Attack) {
                    return false;
                }
                let spaces = self.battle.attack_spaces(id, false);
                self.show_spaces(id, spaces);
                self.complete(payload);
            }
            Command::Attack => {
                let Some(target) = payload.target else {
                    return false;
                };
                if !on_active_side || actions.performed(ActionKind::Attack) {
                    return false;
                }
                self.battle.begin_action(id, ActionKind::Attack);
                let Some(outcome) = self.battle.resolve_attack(id, target) else {
                    self.battle.abandon_action(id, ActionKind::Attack);
                    return false;
                };
                self.clear_spaces();
                self.events.push(BattleEvent::AttackResolved {
                    attacker: id,
                    target: outcome.target,
                    damage: outcome.damage,
                    remaining_health: outcome.remaining_health,
                });
                if outcome.killed {
                    if self.selection == Some(outcome.target) {
                        self.set_selection(None);
                    }
                    self.events.push(BattleEvent::ActorDefeated { actor: outcome.target });
                }
                let timing = *self.battle.timing();
                self.activity = Activity::AwaitingAttack {
                    payload,
                    remaining: timing.attack_ticks,
                };
                if timing.presentation == PresentationMode::Headless && timing.attack_ticks == 0 {
                    self.finish_presentation();
                }
            }
            Command::Cancel | Command::Revert => {
                self.cancel_actor(id);
                if payload.command == Command::Revert && self.selection.is_some() {
                    self.set_selection(None);
                }
                self.complete(payload);
            }
            Command::EndTurn => {
                if !on_active_side {
                    return false;
                }
                self.cancel_actor(id);
                self.battle.end_actions(id);
                self.complete(payload);
            }
        }
        true
    }

    /// Drop an actor's open session and display, clearing in-progress flags.
    fn cancel_actor(&mut self, id: ActorId) {
        if self.session.as_ref().is_some_and(|session| session.actor() == id) {
            if let Some(session) = self.session.take() {
                session.abort();
            }
            if self.focus == Focus::PathConstruction {
                self.set_focus(Focus::Neutral);
            }
        }
        for kind in ActionKind::ALL {
            self.battle.abandon_action(id, kind);
        }
        if self.shown.as_ref().is_some_and(|(owner, _)| *owner == id) {
            self.clear_spaces();
        }
    }

    /// Record completion and queue the payload's continuations, then the
    /// end-of-turn query.
    fn complete(&mut self, payload: CommandPayload) {
        let CommandPayload {
            actor,
            command,
            continuations,
            ..
        } = payload;
        self.events.push(BattleEvent::CommandCompleted {
            actor,
            command: command.kind(),
        });
        self.queue.extend(
            continuations
                .into_iter()
                .map(|continuation| Queued::Continuation { actor, continuation }),
        );
        self.queue.push_back(Queued::EndOfTurn { actor });
    }

    fn drain_queue(&mut self) {
        if self.draining {
            return;
        }
        self.draining = true;
        while let Some(item) = self.queue.pop_front() {
            match item {
                Queued::Continuation { actor, continuation } => self.run_continuation(actor, continuation),
                Queued::EndOfTurn { actor } => {
                    if self.battle.query_end_of_turn(actor) && self.selection == Some(actor) {
                        self.clear_spaces();
                        self.set_selection(None);
                    }
                    self.check_handoff();
                }
            }
        }
        self.draining = false;
    }

    fn run_continuation(&mut self, actor: ActorId, continuation: Continuation) {
        match continuation {
            Continuation::ClearSelection => {
                self.clear_spaces();
                self.set_selection(None);
            }
            Continuation::Reselect => {
                let Some(cell) = self
                    .battle
                    .actor(actor)
                    .filter(|actor| actor.is_alive())
                    .map(|actor| actor.pose.cell)
                else {
                    return;
                };
                if self.battle.available_actions(actor).is_empty() {
                    return;
                }
                self.set_selection(Some(actor));
                self.offer_decision(actor, cell);
            }
            Continuation::Signal(marker) => self.events.push(BattleEvent::Signal { actor, marker }),
            Continuation::Then(next) => {
                if !self.parse_command(*next) {
                    tracing::debug!(%actor, "follow-up command rejected");
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Decisions
    // ------------------------------------------------------------------

    /// Ask the actor's side delegate for a command. Returns `true` if the
    /// delegate dispatched an accepted payload or deferred to the menu.
    fn offer_decision(&mut self, actor: ActorId, target: CellCoord) -> bool {
        let Some(side) = self.battle.actor(actor).map(|actor| actor.side) else {
            return false;
        };
        let available = self.battle.available_actions(actor);
        if available.is_empty() {
            return false;
        }
        let request = DecisionRequest {
            actor,
            target,
            available,
        };
        let Some(delegate) = self.delegates.get_mut(usize::from(side.0)) else {
            return false;
        };
        let decision = delegate.decide(&request, &self.battle);
        match decision {
            Decision::Command(payload) => self.parse_command(payload),
            Decision::Deferred => {
                self.set_focus(Focus::Menu {
                    depth: 1,
                    pending: Some(actor),
                });
                self.events.push(BattleEvent::DecisionPending {
                    actor,
                    available: request.available,
                });
                true
            }
        }
    }

    fn poll_automated(&mut self) {
        if !matches!(self.activity, Activity::Idle) || self.focus != Focus::Neutral || !self.queue.is_empty() {
            return;
        }
        let side = self.battle.turns().active_side();
        let automated = self
            .delegates
            .get(usize::from(side.0))
            .is_some_and(|delegate| delegate.drives_turn());
        if !automated {
            return;
        }
        let Some(actor) = self.battle.turns_mut().active_roster_mut().next_pending() else {
            return;
        };
        let Some(cell) = self.battle.actor(actor).map(|actor| actor.pose.cell) else {
            return;
        };
        self.move_cursor_to(cell);
        if self.offer_decision(actor, cell) {
            return;
        }
        if !self.parse_command(CommandPayload::new(actor, Command::EndTurn)) {
            self.battle.end_actions(actor);
            self.battle.query_end_of_turn(actor);
            self.check_handoff();
        }
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    fn handle_input(&mut self, input: InputEvent) {
        match self.focus {
            Focus::Neutral => {
                if let Some(direction) = input.direction {
                    let next = self.cursor.step(direction);
                    if self.battle.grid().in_bounds(next) {
                        self.move_cursor_to(next);
                    }
                }
                match input.button {
                    Some(Button::Confirm) => self.confirm(),
                    Some(Button::Reverse) => {
                        if let Some(actor) = self.selection {
                            self.parse_command(CommandPayload::new(actor, Command::Revert));
                        }
                    }
                    Some(Button::OpenMenu) => self.set_focus(Focus::Menu {
                        depth: 1,
                        pending: None,
                    }),
                    Some(Button::Rotate(_)) | None => {}
                }
            }
            Focus::PathConstruction => {
                if let Some(direction) = input.direction {
                    self.extend_path(|session, battle| session.append_translate(battle.grid(), direction));
                }
                match input.button {
                    Some(Button::Rotate(sign)) if sign != 0 => {
                        self.extend_path(|session, battle| session.append_rotate(battle.grid(), sign > 0));
                    }
                    Some(Button::Confirm) => self.commit_path(),
                    Some(Button::Reverse) => self.abort_path(),
                    _ => {}
                }
            }
            Focus::Menu { depth, pending } => match input.button {
                Some(Button::OpenMenu) => self.set_focus(Focus::Menu {
                    depth: depth + 1,
                    pending,
                }),
                Some(Button::Reverse) => {
                    if depth > 1 {
                        self.set_focus(Focus::Menu {
                            depth: depth - 1,
                            pending,
                        });
                    } else {
                        self.set_focus(Focus::Neutral);
                        if let Some(actor) = pending {
                            self.parse_command(CommandPayload::new(actor, Command::Revert));
                        }
                    }
                }
                _ => {}
            },
        }
    }

    /// Confirm in neutral focus: dispatch on an action space, or change the
    /// selection.
    fn confirm(&mut self) {
        let cell = self.cursor;
        if let Some(selected) = self.selection {
            if self.battle.is_performing_action(selected) {
                return;
            }
            let space = self.shown.as_ref().and_then(|(owner, spaces)| {
                (*owner == selected)
                    .then(|| spaces.iter().find(|space| space.cell == cell && !space.invalid))
                    .flatten()
                    .copied()
            });
            if let Some(space) = space {
                self.dispatch_space(selected, space);
                return;
            }
        }

        let occupant = self.battle.actor_at(cell).map(|actor| (actor.id, actor.side, actor.actions.is_spent()));
        match occupant {
            None => {
                if let Some(previous) = self.selection {
                    self.parse_command(CommandPayload::new(previous, Command::Revert));
                }
            }
            Some((actor, side, spent)) => {
                self.clear_spaces();
                self.set_selection(Some(actor));
                if side != self.battle.turns().active_side() {
                    self.parse_command(CommandPayload::new(actor, Command::GenerateMoveSpaces).with_target(cell));
                } else if !spent {
                    self.offer_decision(actor, cell);
                }
            }
        }
    }

    fn dispatch_space(&mut self, actor: ActorId, space: ActionSpace) {
        let payload = match space.command {
            CommandKind::Attack => CommandPayload::new(actor, Command::Attack),
            CommandKind::Move => {
                let Some(path) = self.battle.actor(actor).and_then(|unit| {
                    let spaces = self.battle.move_spaces(actor)?;
                    let mut session = PathSession::begin(unit);
                    for direction in spaces.directions_to(space.cell)? {
                        if !session.append_translate(self.battle.grid(), direction) {
                            return None;
                        }
                    }
                    Some(session.commit())
                }) else {
                    return;
                };
                CommandPayload::new(actor, Command::Move { path })
            }
            other => {
                tracing::debug!(%actor, command = ?other, "action space has no direct command");
                return;
            }
        };
        self.parse_command(
            payload
                .with_target(space.cell)
                .then(Continuation::Reselect),
        );
    }

    fn extend_path<F>(&mut self, append: F)
    where
        F: FnOnce(&mut PathSession, &Battle) -> bool,
    {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !append(session, &self.battle) {
            return;
        }
        self.events.push(BattleEvent::PathUpdated {
            actor: session.actor(),
            destination: session.current_pose(),
            steps: session.steps().len().saturating_sub(1),
            remaining: session.remaining_budget(),
        });
    }

    fn commit_path(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let actor = session.actor();
        let path = session.commit();
        let destination = path.destination().cell;
        self.set_focus(Focus::Neutral);
        let payload = CommandPayload::new(actor, Command::Move { path })
            .with_target(destination)
            .then(Continuation::Reselect);
        if !self.parse_command(payload) {
            self.battle.abandon_action(actor, ActionKind::Move);
            self.clear_spaces();
        }
    }

    fn abort_path(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let actor = session.actor();
        session.abort();
        self.battle.abandon_action(actor, ActionKind::Move);
        self.clear_spaces();
        self.set_focus(Focus::Neutral);
    }

    // ------------------------------------------------------------------
    // Suspensions
    // ------------------------------------------------------------------

    fn advance_replay(&mut self) {
        let Activity::Replaying { replay, .. } = &mut self.activity else {
            return;
        };
        let actor = replay.actor();
        match replay.advance() {
            ReplayTick::InProgress(pose) => self.events.push(BattleEvent::ActorPose { actor, pose }),
            ReplayTick::StepCompleted(step) => {
                let finished = replay.is_finished();
                if !self.battle.relocate_actor(actor, step.to) {
                    debug_assert!(false, "replay step for {actor} no longer fits at {}", step.to.cell);
                    tracing::error!(%actor, cell = %step.to.cell, "replay step refused, ending move early");
                    self.end_replay();
                    return;
                }
                self.events.push(BattleEvent::ActorPose {
                    actor,
                    pose: VisualPose::at_rest(step.to),
                });
                #[cfg(any(debug_assertions, feature = "debug-validation"))]
                self.validate();
                if finished {
                    self.end_replay();
                }
            }
            ReplayTick::Finished => self.end_replay(),
        }
    }

    fn end_replay(&mut self) {
        match std::mem::replace(&mut self.activity, Activity::Idle) {
            Activity::Replaying { payload, .. } => self.finish_move(payload),
            other => self.activity = other,
        }
    }

    fn finish_move(&mut self, payload: CommandPayload) {
        let actor = payload.actor;
        self.battle.complete_action(actor, ActionKind::Move);
        if let Some(pose) = self.battle.actor(actor).map(|actor| actor.pose) {
            self.events.push(BattleEvent::MoveFinished {
                actor,
                destination: pose,
            });
            self.move_cursor_to(pose.cell);
        }
        self.complete(payload);
    }

    fn advance_delay(&mut self) {
        if self.battle.timing().presentation == PresentationMode::Signalled {
            return;
        }
        let elapsed = match &mut self.activity {
            Activity::AwaitingAttack { remaining, .. } | Activity::PassingTurn { remaining } => {
                *remaining = remaining.saturating_sub(1);
                *remaining == 0
            }
            _ => false,
        };
        if elapsed {
            self.finish_presentation();
        }
    }

    fn finish_presentation(&mut self) {
        match std::mem::replace(&mut self.activity, Activity::Idle) {
            Activity::AwaitingAttack { payload, .. } => {
                self.battle.complete_action(payload.actor, ActionKind::Attack);
                self.complete(payload);
            }
            Activity::PassingTurn { .. } => {
                let turns = self.battle.turns();
                tracing::debug!(side = %turns.active_side(), turn = turns.turn(), "turn banner finished");
                self.events.push(BattleEvent::TurnStarted {
                    side: turns.active_side(),
                    turn: turns.turn(),
                });
            }
            other => self.activity = other,
        }
    }

    // ------------------------------------------------------------------
    // Turn handoff
    // ------------------------------------------------------------------

    fn check_handoff(&mut self) {
        if matches!(self.activity, Activity::MatchOver { .. }) {
            return;
        }
        if let Some(winner) = self.battle.turns().outcome() {
            self.end_match(winner);
            return;
        }
        if !matches!(self.activity, Activity::Idle) || !self.battle.turns().active_roster().is_exhausted() {
            return;
        }
        match self.battle.turns_mut().pass_turn() {
            Handoff::Next(side) => self.start_side(side),
            Handoff::MatchOver(winner) => self.end_match(winner),
        }
    }

    /// Input-locked setup of a side's turn: reset, rebuild roster, move the
    /// cursor, raise the banner.
    fn start_side(&mut self, side: SideId) {
        if let Some(session) = self.session.take() {
            session.abort();
        }
        self.clear_spaces();
        self.set_selection(None);
        self.set_focus(Focus::Neutral);
        self.battle.begin_side_turn(side);

        let roster = self.battle.turns().active_roster();
        let label = roster.label().to_string();
        let first = roster.first_pending();
        if let Some(cell) = first.and_then(|id| self.battle.actor(id)).map(|actor| actor.pose.cell) {
            self.move_cursor_to(cell);
        }
        let turn = self.battle.turns().turn();
        self.events.push(BattleEvent::TurnBanner { side, label, turn });

        let timing = *self.battle.timing();
        self.activity = Activity::PassingTurn {
            remaining: timing.banner_ticks,
        };
        if timing.presentation == PresentationMode::Headless && timing.banner_ticks == 0 {
            self.finish_presentation();
        }
    }

    fn end_match(&mut self, winner: Option<SideId>) {
        if let Some(session) = self.session.take() {
            session.abort();
        }
        self.clear_spaces();
        self.set_focus(Focus::Neutral);
        self.queue.clear();
        self.activity = Activity::MatchOver { winner };
        tracing::info!(?winner, turn = self.battle.turns().turn(), "match over");
        self.events.push(BattleEvent::MatchOver { winner });
    }

    // ------------------------------------------------------------------
    // Display state
    // ------------------------------------------------------------------

    fn set_focus(&mut self, focus: Focus) {
        if self.focus == focus {
            return;
        }
        let changed_kind = self.focus.kind() != focus.kind();
        tracing::debug!(from = ?self.focus, to = ?focus, "focus changed");
        self.focus = focus;
        if changed_kind {
            self.events.push(BattleEvent::FocusChanged { focus: focus.kind() });
        }
    }

    fn set_selection(&mut self, actor: Option<ActorId>) {
        if self.selection == actor {
            return;
        }
        self.selection = actor;
        self.events.push(BattleEvent::SelectionChanged { actor });
    }

    fn move_cursor_to(&mut self, cell: CellCoord) {
        if self.cursor == cell {
            return;
        }
        self.cursor = cell;
        self.events.push(BattleEvent::CursorMoved { cell });
    }

    fn show_spaces(&mut self, actor: ActorId, spaces: Vec<ActionSpace>) {
        self.events.push(BattleEvent::ActionSpacesShown {
            actor,
            spaces: spaces.clone(),
        });
        self.shown = Some((actor, spaces));
    }

    fn clear_spaces(&mut self) {
        if let Some((actor, _)) = self.shown.take() {
            self.events.push(BattleEvent::ActionSpacesCleared { actor });
        }
    }

    #[cfg(any(debug_assertions, feature = "debug-validation"))]
    fn validate(&self) {
        let problems = self.battle.validate_occupancy();
        for problem in &problems {
            tracing::error!(%problem, "occupancy invariant violated");
        }
        debug_assert!(problems.is_empty(), "occupancy invariant violated: {problems:?}");
    }
}
