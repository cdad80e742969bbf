//! Viewport onto the world: canvas and world space conversion, pan and zoom.

pub const MIN_ZOOM: f64 = 1.0 / 16.0;
pub const MAX_ZOOM: f64 = 16.0;
pub const ZOOM_STEP_FACTOR: f64 = 9.0 / 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Viewport onto the world. `offset` is where the camera has been panned to,
/// in canvas pixels at the current zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub offset_x: f64,
    pub offset_y: f64,
    zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Camera {
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn canvas_to_world(&self, canvas_x: f64, canvas_y: f64) -> (f64, f64) {
        (
            (canvas_x + self.offset_x) / self.zoom,
            (canvas_y + self.offset_y) / self.zoom,
        )
    }

    pub fn world_to_canvas(&self, world_x: f64, world_y: f64) -> (f64, f64) {
        (
            world_x * self.zoom - self.offset_x,
            world_y * self.zoom - self.offset_y,
        )
    }

    /// Moves the view by a drag of (`dx`, `dy`) canvas pixels.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x -= dx;
        self.offset_y -= dy;
    }

    /// Steps the zoom by one factor, keeping the world point under
    /// (`center_x`, `center_y`) fixed on the canvas.
    pub fn change_zoom(&mut self, direction: ZoomDirection, center_x: f64, center_y: f64) {
        let old_zoom = self.zoom;
        self.zoom = match direction {
            ZoomDirection::In => (old_zoom * ZOOM_STEP_FACTOR).min(MAX_ZOOM),
            ZoomDirection::Out => (old_zoom / ZOOM_STEP_FACTOR).max(MIN_ZOOM),
        };

        self.offset_x =
            self.zoom * (self.offset_x / old_zoom + center_x / old_zoom - center_x / self.zoom);
        self.offset_y =
            self.zoom * (self.offset_y / old_zoom + center_y / old_zoom - center_y / self.zoom);
    }

    /// Centres a `screen_width` x `screen_height` canvas on a world point.
    pub fn teleport_to(&mut self, world_x: f64, world_y: f64, screen_width: f64, screen_height: f64) {
        self.offset_x = world_x * self.zoom - screen_width / 2.0;
        self.offset_y = world_y * self.zoom - screen_height / 2.0;
    }
}
