// geometry is owned by whatever draws the circuit; the engine only carries it around so documents round trip

#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, zoom: 1.0 }
    }
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

impl Size {
    pub const GATE: Size = Size { width: 60.0, height: 40.0 };
    pub const PIN: Size = Size { width: 40.0, height: 40.0 };

    // gates grow vertically so every input pin gets its own slot
    pub fn for_inputs(num_inputs: usize) -> Self {
        const PIN_SPACING: f32 = 20.0;
        let needed = (num_inputs as f32) * PIN_SPACING;
        Size { width: Self::GATE.width, height: Self::GATE.height.max(needed) }
    }
}

#[cfg(test)]
mod test {
    use super::{Position, Size};

    #[test]
    fn offset() {
        assert_eq!(Position::new(1.0, 2.0).offset(10.0, -2.0), Position::new(11.0, 0.0));
    }

    #[test]
    fn gate_height_grows_with_inputs() {
        assert_eq!(Size::for_inputs(2), Size::GATE);
        assert_eq!(Size::for_inputs(8).height, 160.0);
    }
}
