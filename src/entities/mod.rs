//! Agent records and the rules for moving one agent into a target cell.
//!
//! The contest rules compare ages normalized to a common generation
//! instant: a mover has always been ticked by the time it arrives, but
//! the occupier may have been ticked earlier or not at all, depending on
//! iteration order and band. The `gen_updated` timestamps reconcile the
//! two so the outcome does not depend on scheduling.

use tracing::error;

use crate::world::CellContent;

/// Per-rabbit record. `age` counts generations since birth or since the
/// last reproduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RabbitState {
    pub age: u32,
    /// Last generation in which this record was mutated.
    pub gen_updated: u32,
    /// Value of `age` before the last update.
    pub prev_age: u32,
}

impl RabbitState {
    /// A rabbit born in generation `gen`.
    pub fn newborn(gen: u32) -> Self {
        Self {
            age: 0,
            gen_updated: gen,
            prev_age: 0,
        }
    }

    /// Normal end-of-turn aging.
    #[inline]
    pub fn tick_age(&mut self, gen: u32) {
        self.prev_age = self.age;
        self.gen_updated = gen;
        self.age += 1;
    }

    /// Reset applied to the parent when it leaves a newborn behind.
    #[inline]
    pub fn reset_after_breeding(&mut self, gen: u32) {
        self.gen_updated = gen;
        self.prev_age = 0;
        self.age = 0;
    }
}

/// Per-fox record. `proc_age` drives reproduction, `food_age` counts
/// generations since the last meal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoxState {
    pub proc_age: u32,
    pub food_age: u32,
    /// Last generation in which this record was mutated.
    pub gen_updated: u32,
    /// Value of `proc_age` before the last update.
    pub prev_proc_age: u32,
}

impl FoxState {
    /// A fox born in generation `gen`.
    pub fn newborn(gen: u32) -> Self {
        Self {
            proc_age: 0,
            food_age: 0,
            gen_updated: gen,
            prev_proc_age: 0,
        }
    }

    /// Stamp the record as updated this generation, keeping the previous
    /// breeding age around. The `proc_age` increment is separate because
    /// it only applies on a successful move.
    #[inline]
    pub fn mark_updated(&mut self, gen: u32) {
        self.gen_updated = gen;
        self.prev_proc_age = self.proc_age;
    }

    /// Reset applied to the parent when it leaves a newborn behind.
    #[inline]
    pub fn reset_after_breeding(&mut self, gen: u32) {
        self.gen_updated = gen;
        self.prev_proc_age = self.proc_age;
        self.proc_age = 0;
    }
}

/// Outcome of moving an agent into a target cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The destination was empty; the agent now occupies it.
    MovedToEmpty,
    /// Same-species contest won; the previous occupier was destroyed.
    WonConflict,
    /// Fox onto rabbit; the prey was destroyed and the fox placed.
    KilledPrey,
    /// Same-species contest lost; the mover was destroyed.
    Lost,
    /// The destination can never legally be targeted (rock, or a fox for
    /// a rabbit). Indicates an analyzer bug; the move is skipped.
    Illegal,
}

/// Normalize two ages to the same generation instant. Whichever record
/// was updated in an earlier generation compares one generation older.
#[inline]
fn effective_ages(
    mover_age: u32,
    mover_gen: u32,
    occupier_age: u32,
    occupier_gen: u32,
) -> (u32, u32) {
    if mover_gen > occupier_gen {
        (mover_age, occupier_age + 1)
    } else if occupier_gen > mover_gen {
        (mover_age + 1, occupier_age)
    } else {
        (mover_age, occupier_age)
    }
}

/// Move a rabbit into `target`. Ties go to the occupier.
pub fn resolve_rabbit_move(rabbit: RabbitState, target: &mut CellContent) -> MoveOutcome {
    match *target {
        CellContent::Empty => {
            *target = CellContent::Rabbit(rabbit);
            MoveOutcome::MovedToEmpty
        }
        CellContent::Rabbit(occupier) => {
            let (mover_age, occupier_age) = effective_ages(
                rabbit.age,
                rabbit.gen_updated,
                occupier.age,
                occupier.gen_updated,
            );
            if mover_age > occupier_age {
                *target = CellContent::Rabbit(rabbit);
                MoveOutcome::WonConflict
            } else {
                MoveOutcome::Lost
            }
        }
        CellContent::Rock | CellContent::Fox(_) => {
            error!(
                "tried moving a rabbit onto {}",
                target.kind_name().unwrap_or("EMPTY")
            );
            MoveOutcome::Illegal
        }
    }
}

/// Move a fox into `target`. Contest order: higher effective breeding
/// age wins; equal breeding ages fall back to hunger, where the less
/// hungry fox (lower `food_age`) wins; a full tie keeps the occupier.
pub fn resolve_fox_move(fox: FoxState, target: &mut CellContent) -> MoveOutcome {
    match *target {
        CellContent::Empty => {
            *target = CellContent::Fox(fox);
            MoveOutcome::MovedToEmpty
        }
        CellContent::Rabbit(_) => {
            // Predation: the prey record is destroyed with the overwrite.
            *target = CellContent::Fox(fox);
            MoveOutcome::KilledPrey
        }
        CellContent::Fox(occupier) => {
            let (mover_age, occupier_age) = effective_ages(
                fox.proc_age,
                fox.gen_updated,
                occupier.proc_age,
                occupier.gen_updated,
            );
            if mover_age > occupier_age
                || (mover_age == occupier_age && fox.food_age < occupier.food_age)
            {
                *target = CellContent::Fox(fox);
                MoveOutcome::WonConflict
            } else {
                MoveOutcome::Lost
            }
        }
        CellContent::Rock => {
            error!("tried moving a fox onto a rock");
            MoveOutcome::Illegal
        }
    }
}
