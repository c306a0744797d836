use crate::channels::{ChannelMap, ExpressionKind};
use crate::constants::{lerp, smoothstep};
use crate::rig::ChannelTable;

/// An eased move of one expression channel toward a target weight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExpressionTransition {
    pub channel: usize,
    pub start: f32,
    pub target: f32,
    pub elapsed: f32,
    pub duration: f32,
}

impl ExpressionTransition {
    pub fn value(&self) -> f32 {
        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        lerp(self.start, self.target, smoothstep(t))
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// At most one transition per expression, held in a slot per kind.
///
/// Starting a transition replaces whatever the slot held, so a channel
/// never has two writers racing.
#[derive(Debug, Default)]
pub struct ExpressionManager {
    slots: [Option<ExpressionTransition>; 2],
}

impl ExpressionManager {
    /// Drive the expression labelled `name` to `target` over `duration`
    /// seconds. Unknown labels, unresolved channels and non-finite targets
    /// are ignored; a non-finite duration writes the target at once.
    /// Returns whether a channel was affected.
    pub fn set_expression(
        &mut self,
        channels: &ChannelMap,
        name: &str,
        target: f32,
        duration: f32,
        mesh: &mut dyn ChannelTable,
    ) -> bool {
        if !target.is_finite() {
            return false;
        }
        let Some(kind) = channels.kind_for(name) else {
            return false;
        };
        let Some(channel) = channels.expression(kind) else {
            return false;
        };
        let slot = &mut self.slots[kind.slot()];
        *slot = None;
        if !duration.is_finite() || duration <= 0.0 {
            mesh.set_weight(channel, target);
            return true;
        }
        *slot = Some(ExpressionTransition {
            channel,
            start: mesh.weight(channel),
            target,
            elapsed: 0.0,
            duration,
        });
        log::debug!("[expression] {name} -> {target:.1} over {duration:.2}s");
        true
    }

    pub fn clear_expression(
        &mut self,
        channels: &ChannelMap,
        name: &str,
        duration: f32,
        mesh: &mut dyn ChannelTable,
    ) -> bool {
        self.set_expression(channels, name, 0.0, duration, mesh)
    }

    /// Advance every running transition by `dt` and write its weight.
    /// Finished transitions are pinned to their target and dropped.
    pub fn tick(&mut self, dt: f32, mesh: &mut dyn ChannelTable) {
        for slot in &mut self.slots {
            let Some(tr) = slot.as_mut() else { continue };
            tr.elapsed += dt;
            if tr.is_finished() {
                mesh.set_weight(tr.channel, tr.target);
                *slot = None;
            } else {
                mesh.set_weight(tr.channel, tr.value());
            }
        }
    }

    pub fn active(&self, kind: ExpressionKind) -> Option<&ExpressionTransition> {
        self.slots[kind.slot()].as_ref()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn cancel_all(&mut self) {
        self.slots = [None, None];
    }
}
