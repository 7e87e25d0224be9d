//! Viewport and coordinate transformation for the plot surface.
//!
//! Converts client (pointer) coordinates into scene-local coordinates and
//! back. Both spaces are y-down, so the mapping is a uniform scale plus a
//! translation.

use std::fmt;

use lightplot_core::{Point, Rect};

const MIN_ZOOM: f64 = 0.1;
const MAX_ZOOM: f64 = 50.0;
const ZOOM_STEP: f64 = 1.2;

/// Zoom and pan applied between the client area and the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    zoom: f64,
    pan_x: f64,
    pan_y: f64,
    client_width: f64,
    client_height: f64,
}

impl Viewport {
    /// Creates a viewport at 1:1 with the scene origin at the client origin.
    pub fn new(client_width: f64, client_height: f64) -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
            client_width,
            client_height,
        }
    }

    pub fn client_width(&self) -> f64 {
        self.client_width
    }

    pub fn client_height(&self) -> f64 {
        self.client_height
    }

    /// Sets the client dimensions (typically called when the window resizes).
    pub fn set_client_size(&mut self, width: f64, height: f64) {
        self.client_width = width;
        self.client_height = height;
    }

    /// Gets the current zoom level (1.0 = 100%).
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Sets the zoom level; values outside 0.1..50.0 are ignored.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom > MIN_ZOOM && zoom < MAX_ZOOM {
            self.zoom = zoom;
        }
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom * ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom / ZOOM_STEP);
    }

    /// Client-space offset of the scene origin.
    pub fn pan(&self) -> Point {
        Point::new(self.pan_x, self.pan_y)
    }

    pub fn set_pan(&mut self, x: f64, y: f64) {
        self.pan_x = x;
        self.pan_y = y;
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Converts client coordinates to scene-local coordinates.
    ///
    /// ```text
    /// local = (client - pan) / zoom
    /// ```
    pub fn client_to_local(&self, client: Point) -> Point {
        Point::new(
            (client.x - self.pan_x) / self.zoom,
            (client.y - self.pan_y) / self.zoom,
        )
    }

    /// Converts scene-local coordinates to client coordinates.
    pub fn local_to_client(&self, local: Point) -> Point {
        Point::new(
            local.x * self.zoom + self.pan_x,
            local.y * self.zoom + self.pan_y,
        )
    }

    /// Zooms while keeping `local` at the same client position.
    pub fn zoom_to_point(&mut self, local: Point, new_zoom: f64) {
        if new_zoom <= MIN_ZOOM || new_zoom >= MAX_ZOOM {
            return;
        }
        let client = self.local_to_client(local);
        self.zoom = new_zoom;
        self.pan_x = client.x - local.x * new_zoom;
        self.pan_y = client.y - local.y * new_zoom;
    }

    /// Fits `bounds` into the client area, reserving `padding` (0.0 - 0.5) of
    /// each dimension on every side, and centers it.
    pub fn fit_to_bounds(&mut self, bounds: Rect, padding: f64) {
        if bounds.width <= 0.0 || bounds.height <= 0.0 {
            return;
        }

        let padding_factor = 1.0 - padding.clamp(0.0, 0.45) * 2.0;
        let zoom_x = self.client_width * padding_factor / bounds.width;
        let zoom_y = self.client_height * padding_factor / bounds.height;
        let zoom = zoom_x.min(zoom_y).clamp(MIN_ZOOM, MAX_ZOOM);

        let offset_x = (self.client_width - bounds.width * zoom) / 2.0;
        let offset_y = (self.client_height - bounds.height * zoom) / 2.0;

        self.zoom = zoom;
        self.pan_x = offset_x - bounds.x * zoom;
        self.pan_y = offset_y - bounds.y * zoom;
    }

    /// Resets to 1:1 with no pan.
    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.pan_x = 0.0;
        self.pan_y = 0.0;
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Zoom: {:.2}x | Pan: ({:.1}, {:.1})",
            self.zoom, self.pan_x, self.pan_y
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1200.0, 800.0)
    }
}
