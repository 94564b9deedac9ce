//! `proptest` strategies for engine types.

use proptest::prelude::*;
use tactics_core::prelude::*;

/// Any cardinal direction.
pub fn arb_direction() -> impl Strategy<Value = Direction> {
    prop::sample::select(Direction::ALL.to_vec())
}

/// Any quarter-turn rotation.
pub fn arb_rotation() -> impl Strategy<Value = Rotation> {
    (0i32..4).prop_map(Rotation::from_quarter_turns)
}

/// Odd footprint dimensions up to 5x5.
pub fn arb_footprint() -> impl Strategy<Value = Footprint> {
    (0u32..3, 0u32..3).prop_map(|(w, h)| {
        Footprint::new(w * 2 + 1, h * 2 + 1).unwrap_or_else(|_| Footprint::single())
    })
}

/// Grid dimensions between 1 and `max` on each axis.
pub fn arb_dimensions(max: u32) -> impl Strategy<Value = (u32, u32)> {
    (1..=max, 1..=max)
}

/// A cell possibly outside a `width` x `height` grid by up to two cells.
pub fn arb_cell_near(width: u32, height: u32) -> impl Strategy<Value = CellCoord> {
    let w = i32::try_from(width).unwrap_or(i32::MAX - 2);
    let h = i32::try_from(height).unwrap_or(i32::MAX - 2);
    (-2..w + 2, -2..h + 2).prop_map(|(x, y)| CellCoord::new(x, y))
}

/// One tick of input, often empty.
pub fn arb_input() -> impl Strategy<Value = Option<InputEvent>> {
    let button = prop_oneof![
        Just(Button::Confirm),
        Just(Button::Reverse),
        Just(Button::OpenMenu),
        Just(Button::Rotate(1)),
        Just(Button::Rotate(-1)),
    ];
    prop_oneof![
        2 => Just(None),
        3 => arb_direction().prop_map(|d| Some(InputEvent::direction(d))),
        2 => button.prop_map(|b| Some(InputEvent::button(b))),
    ]
}

/// A script of `len` ticks of input.
pub fn arb_input_script(len: usize) -> impl Strategy<Value = Vec<Option<InputEvent>>> {
    prop::collection::vec(arb_input(), len)
}
