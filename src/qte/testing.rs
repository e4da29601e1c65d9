//! Recording collaborators for tests.

use crate::qte::combat::{ActingUnit, AttackContext, CombatSystem, UnitId};
use crate::qte::presentation::Presentation;
use crate::qte::spec::{InputBinding, InputHandle, PromptIcon};

/// Combat system that records every call.
#[derive(Debug, Default)]
pub struct RecordingCombat {
    pub acting: Option<ActingUnit>,
    pub damage: Vec<(UnitId, u32, AttackContext)>,
    pub turns_ended: u32,
}

impl RecordingCombat {
    pub fn with_attack(attack: u32) -> Self {
        Self {
            acting: Some(ActingUnit {
                id: UnitId::new([1; 16]),
                attack,
            }),
            ..Self::default()
        }
    }
}

impl CombatSystem for RecordingCombat {
    fn current_acting_unit(&self) -> Option<ActingUnit> {
        self.acting
    }

    fn apply_damage(&mut self, target: UnitId, amount: u32, context: &AttackContext) {
        self.damage.push((target, amount, context.clone()));
    }

    fn end_turn(&mut self) {
        self.turns_ended += 1;
    }
}

/// Presentation that records prompt calls.
#[derive(Debug, Default)]
pub struct RecordingPresentation {
    pub shown: Vec<InputHandle>,
    pub icons: Vec<Option<PromptIcon>>,
    pub pressed: Vec<bool>,
    pub hidden: u32,
    pub visible: bool,
}

impl Presentation for RecordingPresentation {
    fn show_prompt(&mut self, target: &InputBinding, icon: Option<&PromptIcon>) {
        self.shown.push(target.handle.clone());
        self.icons.push(icon.cloned());
        self.visible = true;
    }

    fn set_prompt_pressed(&mut self, pressed: bool) {
        self.pressed.push(pressed);
    }

    fn hide_prompt(&mut self) {
        self.hidden += 1;
        self.visible = false;
    }
}
