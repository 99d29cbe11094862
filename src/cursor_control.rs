//! Cursor control module for X11-based systems.
//!
//! The tracking loop only needs two things from the display: its size, queried
//! once at startup, and a way to warp the pointer to an absolute position.

use crate::{
    error::{Error, Result},
    mapping::ScreenGeometry,
    utils::safe_cast::f64_to_i16_clamp,
};
use log::{debug, info, warn};
use x11rb::{
    connection::Connection,
    protocol::xproto::{ConnectionExt, Screen},
    rust_connection::RustConnection,
};

/// Moves the pointer to an absolute position
pub trait CursorEffector {
    /// Warp the pointer to `(x, y)` in pixels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CursorControl`] if the move could not be issued.
    fn move_to(&mut self, x: f64, y: f64) -> Result<()>;
}

/// Reports the size of the screen the cursor moves on
pub trait ScreenQuery {
    /// Current screen size
    ///
    /// # Errors
    ///
    /// Returns [`Error::CursorControl`] if the display cannot be queried.
    fn screen_geometry(&self) -> Result<ScreenGeometry>;
}

/// A missing cursor backend fails every move, which callers swallow
impl<E: CursorEffector> CursorEffector for Option<E> {
    fn move_to(&mut self, x: f64, y: f64) -> Result<()> {
        match self {
            Some(effector) => effector.move_to(x, y),
            None => Err(Error::CursorControl("No display connection".to_string())),
        }
    }
}

/// Query `screen`, falling back to `fallback` on failure
pub fn screen_geometry_or<Q: ScreenQuery + ?Sized>(screen: Option<&Q>, fallback: ScreenGeometry) -> ScreenGeometry {
    match screen.map(|s| s.screen_geometry()) {
        Some(Ok(geometry)) if geometry.width > 0 && geometry.height > 0 => geometry,
        Some(Ok(geometry)) => {
            warn!(
                "Display reported {}x{}, using {}x{}",
                geometry.width, geometry.height, fallback.width, fallback.height
            );
            fallback
        }
        Some(Err(e)) => {
            warn!("Error getting screen size: {e}. Using {}x{}", fallback.width, fallback.height);
            fallback
        }
        None => fallback,
    }
}

/// Cursor control implementation for X11
pub struct CursorController {
    connection: RustConnection,
    screen: Screen,
    screen_width: u16,
    screen_height: u16,
}

impl CursorController {
    /// Connect to the X11 display named by `$DISPLAY`
    ///
    /// # Errors
    ///
    /// Returns [`Error::CursorControl`] if no display is reachable.
    pub fn new() -> Result<Self> {
        info!("Initializing X11 cursor controller");

        let (connection, screen_num) = RustConnection::connect(None)
            .map_err(|e| Error::CursorControl(format!("Failed to connect to X11: {e}")))?;

        let screen = connection
            .setup()
            .roots
            .get(screen_num)
            .ok_or_else(|| Error::CursorControl("Failed to get screen".to_string()))?
            .clone();

        let screen_width = screen.width_in_pixels;
        let screen_height = screen.height_in_pixels;

        info!("Connected to X11 display, screen: {}x{}", screen_width, screen_height);

        Ok(Self {
            connection,
            screen,
            screen_width,
            screen_height,
        })
    }

    /// Set cursor position (absolute), clamped to the screen
    ///
    /// # Errors
    ///
    /// Returns [`Error::CursorControl`] if the X server rejects the request.
    pub fn set_position(&self, x: i16, y: i16) -> Result<()> {
        let max_x = i16::try_from(self.screen_width.saturating_sub(1)).unwrap_or(i16::MAX);
        let max_y = i16::try_from(self.screen_height.saturating_sub(1)).unwrap_or(i16::MAX);
        let x = x.clamp(0, max_x);
        let y = y.clamp(0, max_y);

        debug!("Setting cursor position to ({}, {})", x, y);

        self.connection
            .warp_pointer(x11rb::NONE, self.screen.root, 0, 0, 0, 0, x, y)
            .map_err(|e| Error::CursorControl(format!("Failed to warp pointer: {e}")))?;

        self.connection
            .flush()
            .map_err(|e| Error::CursorControl(format!("Failed to flush connection: {e}")))?;

        Ok(())
    }
}

impl CursorEffector for CursorController {
    fn move_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.set_position(f64_to_i16_clamp(x), f64_to_i16_clamp(y))
    }
}

impl ScreenQuery for CursorController {
    fn screen_geometry(&self) -> Result<ScreenGeometry> {
        Ok(ScreenGeometry::new(
            u32::from(self.screen_width),
            u32::from(self.screen_height),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedScreen(Result<ScreenGeometry>);

    impl ScreenQuery for FixedScreen {
        fn screen_geometry(&self) -> Result<ScreenGeometry> {
            match &self.0 {
                Ok(g) => Ok(*g),
                Err(e) => Err(Error::CursorControl(e.to_string())),
            }
        }
    }

    #[test]
    #[ignore] // Requires X11 display
    fn test_cursor_controller_creation() {
        let controller = CursorController::new();
        assert!(controller.is_ok() || controller.is_err());
    }

    #[test]
    fn test_screen_query_fallback() {
        let fallback = ScreenGeometry::default();

        let ok = FixedScreen(Ok(ScreenGeometry::new(2560, 1440)));
        assert_eq!(screen_geometry_or(Some(&ok), fallback), ScreenGeometry::new(2560, 1440));

        let failing = FixedScreen(Err(Error::CursorControl("no display".to_string())));
        assert_eq!(screen_geometry_or(Some(&failing), fallback), fallback);

        let empty = FixedScreen(Ok(ScreenGeometry::new(0, 0)));
        assert_eq!(screen_geometry_or(Some(&empty), fallback), fallback);

        assert_eq!(screen_geometry_or::<FixedScreen>(None, fallback), fallback);
    }

    #[test]
    fn test_missing_effector_fails_softly() {
        let mut effector: Option<CursorController> = None;
        assert!(matches!(effector.move_to(1.0, 1.0), Err(Error::CursorControl(_))));
    }
}
