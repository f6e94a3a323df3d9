// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The frame driver.
//!
//! A [`Stage`] owns the [`SceneGraph`], a stack of scenes whose top is the
//! current scene, and the per-frame protocol. The host calls
//! [`tick`](Stage::tick) with a monotonic timestamp in milliseconds, once
//! per display frame, and forwards pointer and key input.
//!
//! One tick runs, in order:
//!
//! 1. `enterframe` on every node of the current scene, in stack-pop order
//!    (last child first, then its subtree), aging each node by one,
//! 2. `enterframe` on the scene and then on the stage target,
//! 3. `exitframe` on the stage target, which entered scenes forward to their
//!    layers so that they render.

use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::{Point, Vec2};
use tracing::debug;

use crate::config::StageConfig;
use crate::error::Result;
use crate::event::{Button, Event, EventType};
use crate::node::{NodeId, SceneGraph};
use crate::platform::Platform;

/// Phase of a pointer contact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    /// Contact began.
    Start,
    /// Contact moved.
    Move,
    /// Contact ended.
    End,
}

impl TouchPhase {
    fn event_type(self) -> EventType {
        match self {
            Self::Start => EventType::TouchStart,
            Self::Move => EventType::TouchMove,
            Self::End => EventType::TouchEnd,
        }
    }
}

/// Which logical buttons are held.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    pressed: [bool; Button::ALL.len()],
}

impl InputState {
    /// Returns whether `button` is down.
    #[must_use]
    pub fn is_pressed(&self, button: Button) -> bool {
        self.pressed[button as usize]
    }

    fn set(&mut self, button: Button, down: bool) -> bool {
        let slot = &mut self.pressed[button as usize];
        let changed = *slot != down;
        *slot = down;
        changed
    }
}

/// Scene stack, clock and input routing around a [`SceneGraph`].
#[derive(Debug)]
pub struct Stage {
    graph: SceneGraph,
    scenes: Vec<NodeId>,
    root_scene: NodeId,
    running: bool,
    frame: u64,
    /// Timestamp of the previous tick, or `None` before the first tick after
    /// a start.
    current_time: Option<f64>,
    actual_fps: f64,
    /// Page position of the stage's top-left corner.
    offset: Vec2,
    input: InputState,
    key_bindings: HashMap<u32, Button>,
    /// Node that received the last `touchstart`, until `touchend`.
    touch_target: Option<NodeId>,
}

impl Stage {
    /// Creates a stopped stage whose root scene is current.
    ///
    /// # Errors
    ///
    /// Fails if the platform cannot create the root scene's element.
    pub fn new(platform: Box<dyn Platform>, config: StageConfig) -> Result<Self> {
        let mut graph = SceneGraph::new(platform, config);
        let root_scene = graph.create_scene()?;
        let mut stage = Self {
            graph,
            scenes: Vec::new(),
            root_scene,
            running: false,
            frame: 0,
            current_time: None,
            actual_fps: 0.0,
            offset: Vec2::ZERO,
            input: InputState::default(),
            key_bindings: HashMap::new(),
            touch_target: None,
        };
        stage.push_scene(root_scene)?;
        Ok(stage)
    }

    // -- Accessors --

    /// The scene graph.
    #[must_use]
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// The scene graph, for building and mutating nodes.
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    /// The configuration the stage was created with.
    #[must_use]
    pub fn config(&self) -> &StageConfig {
        self.graph.config()
    }

    /// The scene at the top of the stack.
    #[must_use]
    pub fn current_scene(&self) -> NodeId {
        self.scenes.last().copied().unwrap_or(self.root_scene)
    }

    /// The scene at the bottom of the stack, which is never popped.
    #[must_use]
    pub fn root_scene(&self) -> NodeId {
        self.root_scene
    }

    /// The scene stack, bottom first.
    #[must_use]
    pub fn scenes(&self) -> &[NodeId] {
        &self.scenes
    }

    /// Frames ticked so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Frame rate measured over the last tick.
    #[must_use]
    pub fn actual_fps(&self) -> f64 {
        self.actual_fps
    }

    /// Returns whether [`tick`](Self::tick) does anything.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Held buttons.
    #[must_use]
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Sets the page position of the stage, used to convert pointer input.
    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    // -- Scene stack --

    /// Makes `scene` current.
    ///
    /// The old current scene receives `exit`, `scene` receives `enter`, and
    /// its element is appended to the platform root.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotAScene`](crate::SceneError::NotAScene) if `scene` is
    /// some other kind of node, or the first listener error.
    pub fn push_scene(&mut self, scene: NodeId) -> Result<NodeId> {
        let element = self
            .graph
            .scene_element(scene)
            .ok_or(crate::SceneError::NotAScene(scene))?;
        let root = self.graph.platform_mut().root();
        self.graph.platform_mut().insert_before(root, element, None);
        if let Some(&current) = self.scenes.last() {
            self.graph.dispatch_event(current, &mut Event::new(EventType::Exit))?;
        }
        self.scenes.push(scene);
        self.graph.dispatch_event(scene, &mut Event::new(EventType::Enter))?;
        debug!(?scene, depth = self.scenes.len(), "scene pushed");
        Ok(scene)
    }

    /// Drops the current scene and re-enters the one below.
    ///
    /// Returns the popped scene, or `None` when only the root scene is left.
    pub fn pop_scene(&mut self) -> Result<Option<NodeId>> {
        if self.scenes.len() <= 1 {
            debug!("pop_scene: root scene stays, ignoring");
            return Ok(None);
        }
        let Some(scene) = self.scenes.pop() else {
            return Ok(None);
        };
        self.detach_element(scene);
        self.graph.dispatch_event(scene, &mut Event::new(EventType::Exit))?;
        let current = self.current_scene();
        self.graph.dispatch_event(current, &mut Event::new(EventType::Enter))?;
        debug!(?scene, depth = self.scenes.len(), "scene popped");
        Ok(Some(scene))
    }

    /// Pops the current scene, then pushes `scene`. Returns the popped one.
    pub fn replace_scene(&mut self, scene: NodeId) -> Result<Option<NodeId>> {
        let old = self.pop_scene()?;
        self.push_scene(scene)?;
        Ok(old)
    }

    /// Takes `scene` out of the stack wherever it is.
    ///
    /// The current scene is popped normally. A scene below it is dropped
    /// without `exit`/`enter`. Unknown scenes are ignored.
    pub fn remove_scene(&mut self, scene: NodeId) -> Result<Option<NodeId>> {
        if self.scenes.last() == Some(&scene) {
            return self.pop_scene();
        }
        let Some(i) = self.scenes.iter().position(|&s| s == scene) else {
            debug!(?scene, "remove_scene: not on the stack, ignoring");
            return Ok(None);
        };
        if i == 0 {
            debug!(?scene, "remove_scene: root scene stays, ignoring");
            return Ok(None);
        }
        self.scenes.remove(i);
        self.detach_element(scene);
        Ok(Some(scene))
    }

    fn detach_element(&mut self, scene: NodeId) {
        if let Some(element) = self.graph.scene_element(scene) {
            let root = self.graph.platform_mut().root();
            self.graph.platform_mut().remove_child(root, element);
        }
    }

    // -- Clock --

    /// Lets [`tick`](Self::tick) run. The first tick after a start counts
    /// one nominal frame interval.
    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            self.current_time = None;
            debug!("stage started");
        }
    }

    /// Makes [`tick`](Self::tick) a no-op.
    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            debug!(frame = self.frame, "stage stopped");
        }
    }

    /// Runs one frame at host time `now` (milliseconds).
    ///
    /// # Errors
    ///
    /// The first listener error aborts the rest of the frame and is
    /// returned; `frame` is not incremented.
    pub fn tick(&mut self, now: f64) -> Result<()> {
        if !self.running {
            return Ok(());
        }
        let elapsed = match self.current_time {
            Some(prev) => now - prev,
            None => self.graph.config().frame_interval(),
        };
        self.current_time = Some(now);
        self.actual_fps = if elapsed > 0.0 { 1000.0 / elapsed } else { 0.0 };

        let scene = self.current_scene();
        let mut event = Event::new(EventType::EnterFrame).with_elapsed(elapsed);

        let mut pending: Vec<NodeId> = self.graph.children(scene).collect();
        while let Some(node) = pending.pop() {
            if !self.graph.is_alive(node) {
                continue;
            }
            self.graph.age[node.idx as usize] += 1;
            self.graph.dispatch_event(node, &mut event)?;
            if self.graph.is_alive(node) {
                pending.extend(self.graph.children(node));
            }
        }

        if self.graph.is_alive(scene) {
            self.graph.age[scene.idx as usize] += 1;
            self.graph.dispatch_event(scene, &mut event)?;
        }
        self.graph.dispatch_stage_event(&mut event)?;
        self.graph
            .dispatch_stage_event(&mut Event::new(EventType::ExitFrame))?;
        self.frame += 1;
        Ok(())
    }

    // -- Input --

    /// Delivers a pointer contact at page coordinates.
    ///
    /// `touchstart` resolves its target through the current scene's layers;
    /// `touchmove` and `touchend` go to that same node. The position is
    /// converted to game coordinates with the stage offset and scale.
    pub fn touch(&mut self, phase: TouchPhase, page_x: f64, page_y: f64) -> Result<()> {
        let scale = self.graph.config().scale;
        let point = Point::new(
            (page_x - self.offset.x) / scale,
            (page_y - self.offset.y) / scale,
        );
        let target = match phase {
            TouchPhase::Start => {
                let scene = self.current_scene();
                let target = self.graph.determine_event_target(scene, point);
                self.touch_target = Some(target);
                target
            }
            TouchPhase::Move => match self.touch_target {
                Some(t) => t,
                None => return Ok(()),
            },
            TouchPhase::End => match self.touch_target.take() {
                Some(t) => t,
                None => return Ok(()),
            },
        };
        if !self.graph.is_alive(target) {
            debug!(?target, ?phase, "touch target is gone, ignoring");
            return Ok(());
        }
        let mut event = Event::new(phase.event_type()).with_position(point.x, point.y);
        self.graph.dispatch_event(target, &mut event)
    }

    /// Maps a host key code to `button`, replacing any earlier binding.
    pub fn key_bind(&mut self, code: u32, button: Button) {
        self.key_bindings.insert(code, button);
    }

    /// Forgets the binding of `code`.
    pub fn key_unbind(&mut self, code: u32) {
        if self.key_bindings.remove(&code).is_none() {
            debug!(code, "key_unbind: code not bound, ignoring");
        }
    }

    /// Handles a key press. Unbound codes and auto-repeat are ignored.
    pub fn key_down(&mut self, code: u32) -> Result<()> {
        self.key_change(code, true)
    }

    /// Handles a key release.
    pub fn key_up(&mut self, code: u32) -> Result<()> {
        self.key_change(code, false)
    }

    fn key_change(&mut self, code: u32, down: bool) -> Result<()> {
        let Some(&button) = self.key_bindings.get(&code) else {
            return Ok(());
        };
        if !self.input.set(button, down) {
            return Ok(());
        }
        let kind = if down {
            EventType::ButtonDown(button)
        } else {
            EventType::ButtonUp(button)
        };
        let scene = self.current_scene();
        self.graph.dispatch_event(scene, &mut Event::new(kind.clone()))?;
        self.graph.dispatch_stage_event(&mut Event::new(kind))
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use alloc::string::{String, ToString};
    use core::cell::RefCell;

    use super::*;
    use crate::headless::{CanvasCommand, HeadlessPlatform};
    use crate::platform::DomSurface;
    use crate::target::listener;
    use crate::timeline::Easing;

    type Log = Rc<RefCell<Vec<String>>>;

    fn stage() -> (Stage, HeadlessPlatform) {
        let platform = HeadlessPlatform::new();
        let probe = platform.clone();
        let stage = Stage::new(Box::new(platform), StageConfig::default()).unwrap();
        (stage, probe)
    }

    fn record(g: &mut SceneGraph, id: NodeId, kind: EventType, tag: &'static str, log: &Log) {
        let log = Rc::clone(log);
        g.add_event_listener(
            id,
            kind,
            listener(move |_, e| {
                log.borrow_mut().push(alloc::format!("{tag}:{}", e.kind()));
                Ok(())
            }),
        );
    }

    #[test]
    fn scene_stack_enters_and_exits() {
        let (mut s, probe) = stage();
        let root = s.root_scene();
        let menu = s.graph_mut().create_scene().unwrap();
        let log = Log::default();
        for (id, tag) in [(root, "root"), (menu, "menu")] {
            record(s.graph_mut(), id, EventType::Enter, tag, &log);
            record(s.graph_mut(), id, EventType::Exit, tag, &log);
        }

        s.push_scene(menu).unwrap();
        assert_eq!(s.current_scene(), menu);
        let root_el = probe.root();
        assert_eq!(probe.children(root_el).len(), 2, "both scene elements attached");

        assert_eq!(s.pop_scene().unwrap(), Some(menu));
        assert_eq!(s.pop_scene().unwrap(), None, "root is never popped");
        assert_eq!(*log.borrow(), ["root:exit", "menu:enter", "menu:exit", "root:enter"]);
        assert_eq!(probe.children(root_el).len(), 1);
    }

    #[test]
    fn replace_and_remove_scene() {
        let (mut s, _) = stage();
        let a = s.graph_mut().create_scene().unwrap();
        let b = s.graph_mut().create_scene().unwrap();
        let c = s.graph_mut().create_scene().unwrap();
        s.push_scene(a).unwrap();
        assert_eq!(s.replace_scene(b).unwrap(), Some(a));
        s.push_scene(c).unwrap();
        assert_eq!(s.remove_scene(b).unwrap(), Some(b));
        assert_eq!(s.scenes(), [s.root_scene(), c]);
        assert_eq!(s.remove_scene(a).unwrap(), None, "unknown scene");
        assert_eq!(s.remove_scene(s.root_scene()).unwrap(), None);
    }

    #[test]
    fn push_scene_rejects_other_nodes() {
        let (mut s, _) = stage();
        let node = s.graph_mut().create_entity();
        assert!(matches!(
            s.push_scene(node),
            Err(crate::SceneError::NotAScene(n)) if n == node
        ));
    }

    #[test]
    fn enterframe_visits_in_stack_pop_order() {
        let (mut s, _) = stage();
        let scene = s.root_scene();
        let log = Log::default();
        let g = s.graph_mut();
        let a = g.create_entity();
        let group = g.create_group();
        let c = g.create_entity();
        g.add_child(scene, a).unwrap();
        g.add_child(scene, group).unwrap();
        g.add_child(group, c).unwrap();
        for (id, tag) in [(a, "a"), (group, "group"), (c, "c"), (scene, "scene")] {
            record(g, id, EventType::EnterFrame, tag, &log);
        }
        let l = Rc::clone(&log);
        g.stage_target_mut().add_event_listener(
            EventType::EnterFrame,
            listener(move |_, _| {
                l.borrow_mut().push("stage:enterframe".to_string());
                Ok(())
            }),
        );

        s.start();
        s.tick(0.0).unwrap();
        assert_eq!(
            *log.borrow(),
            [
                "group:enterframe",
                "c:enterframe",
                "a:enterframe",
                "scene:enterframe",
                "stage:enterframe",
            ]
        );
        assert_eq!(s.graph().age(c), 1);
        assert_eq!(s.frame(), 1);
    }

    #[test]
    fn elapsed_and_fps_follow_the_clock() {
        let (mut s, _) = stage();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        s.graph_mut().stage_target_mut().add_event_listener(
            EventType::EnterFrame,
            listener(move |_, e| {
                sink.borrow_mut().push(e.require_elapsed()?);
                Ok(())
            }),
        );
        s.tick(5.0).unwrap();
        assert!(seen.borrow().is_empty(), "stopped stages ignore ticks");

        s.start();
        s.tick(100.0).unwrap();
        s.tick(125.0).unwrap();
        let seen = seen.borrow();
        assert!((seen[0] - 1000.0 / 30.0).abs() < 1e-9, "first tick is nominal");
        assert_eq!(seen[1], 25.0);
        assert!((s.actual_fps() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn exitframe_renders_current_scene() {
        let (mut s, probe) = stage();
        let scene = s.root_scene();
        let g = s.graph_mut();
        let box_ = g.create_entity();
        g.set_size(box_, 10.0, 10.0);
        g.set_background_color(box_, Some("red".into()));
        g.add_child(scene, box_).unwrap();
        let canvas = g
            .layer_element(g.layer(scene, crate::layer::Backend::Canvas).unwrap())
            .unwrap();
        probe.clear_commands();

        s.start();
        s.tick(0.0).unwrap();
        let commands = probe.commands(canvas);
        assert_eq!(commands.first(), Some(&CanvasCommand::Clear));
        assert!(
            commands
                .iter()
                .any(|c| matches!(c, CanvasCommand::FillRect(_, color) if color == "red")),
            "{commands:?}"
        );
    }

    #[test]
    fn stage_ticks_drive_time_based_timelines() {
        let platform = HeadlessPlatform::new();
        let config = StageConfig::default().with_time_based_timelines();
        let mut s = Stage::new(Box::new(platform), config).unwrap();
        let scene = s.root_scene();
        let g = s.graph_mut();
        let node = g.create_entity();
        g.add_child(scene, node).unwrap();
        g.tl(node).move_x(100.0, 200.0, Easing::Linear).unwrap();

        s.start();
        s.tick(1000.0).unwrap();
        s.tick(1050.0).unwrap();
        let x = s.graph().props(node).x;
        let expected = 100.0 * (1000.0 / 30.0 + 50.0) / 200.0;
        assert!((x - expected).abs() < 1e-9, "x = {x}");
    }

    #[test]
    fn keys_map_to_buttons() {
        let (mut s, _) = stage();
        let scene = s.root_scene();
        let log = Log::default();
        record(s.graph_mut(), scene, EventType::ButtonDown(Button::Left), "scene", &log);
        record(s.graph_mut(), scene, EventType::ButtonUp(Button::Left), "scene", &log);

        s.key_bind(37, Button::Left);
        s.key_down(37).unwrap();
        s.key_down(37).unwrap();
        assert!(s.input().is_pressed(Button::Left));
        s.key_up(37).unwrap();
        s.key_down(99).unwrap();
        assert_eq!(*log.borrow(), ["scene:leftbuttondown", "scene:leftbuttonup"]);

        s.key_unbind(37);
        s.key_unbind(37);
        s.key_down(37).unwrap();
        assert!(!s.input().is_pressed(Button::Left));
    }

    #[test]
    fn touch_resolves_once_and_converts_coordinates() {
        let platform = HeadlessPlatform::new();
        let mut s = Stage::new(Box::new(platform), StageConfig::default().with_scale(2.0)).unwrap();
        s.set_offset(Vec2::new(100.0, 50.0));
        let scene = s.root_scene();
        let g = s.graph_mut();
        let button = g.create_entity();
        g.set_size(button, 20.0, 20.0);
        g.move_to(button, 10.0, 10.0);
        g.add_child(scene, button).unwrap();

        let hits = Rc::new(RefCell::new(Vec::new()));
        for kind in [EventType::TouchStart, EventType::TouchMove, EventType::TouchEnd] {
            let hits = Rc::clone(&hits);
            g.add_event_listener(
                button,
                kind,
                listener(move |_, e| {
                    hits.borrow_mut().push((e.kind().clone(), e.local_x, e.local_y));
                    Ok(())
                }),
            );
        }

        // Page (130, 80) is game (15, 15).
        s.touch(TouchPhase::Start, 130.0, 80.0).unwrap();
        // Moving off the node still reports to it.
        s.touch(TouchPhase::Move, 400.0, 400.0).unwrap();
        s.touch(TouchPhase::End, 400.0, 400.0).unwrap();
        s.touch(TouchPhase::Move, 130.0, 80.0).unwrap();

        let hits = hits.borrow();
        assert_eq!(hits.len(), 3, "no target after touchend");
        assert_eq!(hits[0], (EventType::TouchStart, 5.0, 5.0));
        assert_eq!(hits[2], (EventType::TouchEnd, 140.0, 165.0));
    }
}
