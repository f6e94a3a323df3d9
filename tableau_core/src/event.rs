// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event types and the per-dispatch [`Event`] value.

use alloc::borrow::Cow;
use core::fmt;

use crate::error::{Result, SceneError};
use crate::node::NodeId;

/// A logical input button.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Button {
    /// Directional left.
    Left,
    /// Directional right.
    Right,
    /// Directional up.
    Up,
    /// Directional down.
    Down,
    /// Primary action.
    A,
    /// Secondary action.
    B,
}

impl Button {
    /// Every button, in a stable order.
    pub const ALL: [Self; 6] = [
        Self::Left,
        Self::Right,
        Self::Up,
        Self::Down,
        Self::A,
        Self::B,
    ];

    /// Lowercase name used as the event type prefix.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
            Self::A => "a",
            Self::B => "b",
        }
    }
}

/// The type tag of an event.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Per-tick update, delivered before rendering.
    EnterFrame,
    /// Delivered after all per-node processing of a tick.
    ExitFrame,
    /// A scene became the current scene.
    Enter,
    /// A scene stopped being the current scene.
    Exit,
    /// A child was attached to the receiver.
    ChildAdded,
    /// A child was detached from the receiver.
    ChildRemoved,
    /// The receiver was attached to a parent.
    Added,
    /// The receiver was detached from its parent.
    Removed,
    /// The receiver joined a scene.
    AddedToScene,
    /// The receiver left its scene.
    RemovedFromScene,
    /// Pointer pressed.
    TouchStart,
    /// Pointer moved while pressed.
    TouchMove,
    /// Pointer released.
    TouchEnd,
    /// The receiver is about to be drawn by its layer.
    Render,
    /// A bound button went down.
    ButtonDown(Button),
    /// A bound button went up.
    ButtonUp(Button),
    /// An action became the timeline head and received its first tick.
    ActionStart,
    /// An action is being advanced.
    ActionTick,
    /// An action finished or was advanced past.
    ActionEnd,
    /// An action was added to a timeline (dispatched on the timeline).
    ActionAdded,
    /// An action was enqueued on a timeline.
    AddedToTimeline,
    /// An action left its timeline.
    RemovedFromTimeline,
    /// Application-defined type.
    Custom(Cow<'static, str>),
}

impl EventType {
    /// Creates an application-defined event type.
    #[must_use]
    pub fn custom(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Custom(name.into())
    }

    /// Returns whether events of this type carry a pointer position.
    #[must_use]
    pub fn is_touch(&self) -> bool {
        matches!(self, Self::TouchStart | Self::TouchMove | Self::TouchEnd)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EnterFrame => "enterframe",
            Self::ExitFrame => "exitframe",
            Self::Enter => "enter",
            Self::Exit => "exit",
            Self::ChildAdded => "childadded",
            Self::ChildRemoved => "childremoved",
            Self::Added => "added",
            Self::Removed => "removed",
            Self::AddedToScene => "addedtoscene",
            Self::RemovedFromScene => "removedfromscene",
            Self::TouchStart => "touchstart",
            Self::TouchMove => "touchmove",
            Self::TouchEnd => "touchend",
            Self::Render => "render",
            Self::ButtonDown(b) => return write!(f, "{}buttondown", b.name()),
            Self::ButtonUp(b) => return write!(f, "{}buttonup", b.name()),
            Self::ActionStart => "actionstart",
            Self::ActionTick => "actiontick",
            Self::ActionEnd => "actionend",
            Self::ActionAdded => "actionadded",
            Self::AddedToTimeline => "addedtotimeline",
            Self::RemovedFromTimeline => "removedfromtimeline",
            Self::Custom(name) => name,
        };
        f.write_str(name)
    }
}

/// A single dispatch's worth of event data.
///
/// Events are created per dispatch and mutated in place by the dispatcher
/// (`target`, `local_x`, `local_y`) and by listeners. Payload fields are
/// optional; handlers that need one use the `require_*` accessors, which
/// fail with [`SceneError::MissingPayload`].
#[derive(Clone, Debug)]
pub struct Event {
    kind: EventType,
    /// The node currently receiving the event.
    pub target: Option<NodeId>,
    /// Pointer x in game coordinates.
    pub x: f64,
    /// Pointer y in game coordinates.
    pub y: f64,
    /// Pointer x relative to the target's offset.
    pub local_x: f64,
    /// Pointer y relative to the target's offset.
    pub local_y: f64,
    /// Elapsed time for frame and tick events.
    pub elapsed: Option<f64>,
    /// Child involved in `childadded` / `childremoved`.
    pub node: Option<NodeId>,
    /// Insertion reference of a `childadded`.
    pub next: Option<NodeId>,
    /// Node owning the timeline for action events.
    pub timeline: Option<NodeId>,
    advance: bool,
}

impl Event {
    /// Creates an event with no payload.
    #[must_use]
    pub fn new(kind: EventType) -> Self {
        Self {
            kind,
            target: None,
            x: 0.0,
            y: 0.0,
            local_x: 0.0,
            local_y: 0.0,
            elapsed: None,
            node: None,
            next: None,
            timeline: None,
            advance: false,
        }
    }

    /// Returns the event type.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &EventType {
        &self.kind
    }

    /// Sets the pointer position.
    #[must_use]
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Sets the elapsed amount.
    #[must_use]
    pub fn with_elapsed(mut self, elapsed: f64) -> Self {
        self.elapsed = Some(elapsed);
        self
    }

    /// Sets the child payload.
    #[must_use]
    pub fn with_node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }

    /// Sets the insertion reference payload.
    #[must_use]
    pub fn with_next(mut self, next: Option<NodeId>) -> Self {
        self.next = next;
        self
    }

    /// Sets the timeline payload.
    #[must_use]
    pub fn with_timeline(mut self, node: NodeId) -> Self {
        self.timeline = Some(node);
        self
    }

    /// Returns `elapsed` or a [`SceneError::MissingPayload`].
    pub fn require_elapsed(&self) -> Result<f64> {
        self.elapsed.ok_or_else(|| self.missing("elapsed"))
    }

    /// Returns `timeline` or a [`SceneError::MissingPayload`].
    pub fn require_timeline(&self) -> Result<NodeId> {
        self.timeline.ok_or_else(|| self.missing("timeline"))
    }

    /// Returns `node` or a [`SceneError::MissingPayload`].
    pub fn require_node(&self) -> Result<NodeId> {
        self.node.ok_or_else(|| self.missing("node"))
    }

    /// Asks the timeline to finish the receiving action after this tick.
    ///
    /// Only meaningful inside an `actiontick` listener; open-ended actions
    /// use it to end themselves.
    pub fn request_next(&mut self) {
        self.advance = true;
    }

    /// Returns whether [`request_next`](Self::request_next) was called.
    #[must_use]
    pub fn next_requested(&self) -> bool {
        self.advance
    }

    fn missing(&self, field: &'static str) -> SceneError {
        SceneError::MissingPayload {
            event: self.kind.clone(),
            field,
        }
    }
}
