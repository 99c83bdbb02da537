/*
 *  display/factory.rs
 *
 *  LyMonS Viewer - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Factory for matrix drivers selected by configuration
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use crate::config::{DriverKind, MatrixConfig};
use crate::display::drivers::headless::HeadlessDriver;
use crate::display::drivers::mock::MockDriver;
use crate::display::error::DisplayFactoryError;
use crate::display::traits::MatrixDriver;
use log::{info, warn};

/// Type alias for boxed matrix driver trait objects
pub type BoxedDriver = Box<dyn MatrixDriver>;

/// Factory for creating matrix drivers from configuration
pub struct DisplayDriverFactory;

impl DisplayDriverFactory {
    /// Create and initialise a matrix driver from configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Matrix configuration (geometry, refresh, driver kind)
    ///
    /// # Returns
    ///
    /// A ready-to-swap boxed driver, or an error if the geometry is unusable
    /// or the panel fails to come up.
    pub fn create_from_config(
        config: &MatrixConfig
    ) -> Result<BoxedDriver, DisplayFactoryError> {
        let (width, height) = (config.panel_width(), config.panel_height());
        if width == 0 || height == 0 {
            return Err(DisplayFactoryError::InvalidGeometry(format!("{}x{}", width, height)));
        }

        let kind = config.driver.unwrap_or_default();
        let mut driver: BoxedDriver = match kind {
            DriverKind::Headless => Box::new(HeadlessDriver::new(config)?),
            DriverKind::Mock => Box::new(MockDriver::new(config)?),
        };

        driver.init()?;

        if let Some(brightness) = config.brightness {
            if let Err(e) = driver.set_brightness(brightness) {
                warn!("Brightness {}% not applied: {}", brightness, e);
            }
        }

        info!("{:?} matrix ready: {}x{} @ {}Hz",
            kind, width, height, driver.capabilities().refresh_hz);
        Ok(driver)
    }
}
