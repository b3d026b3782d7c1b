use std::cmp::max;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use image::RgbImage;
use log::info;
use serde::Deserialize;
use thiserror::Error;

use super::color::*;
use super::integrator::*;
use super::meshutils::ModelCache;
use super::scene_spec::{SceneError, SceneSpec};

fn i32_to_u32(x: i32) -> u32 {
    max(x, 0) as u32
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse config {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error(transparent)]
    Scene(#[from] SceneError),
}

#[derive(Debug, Deserialize)]
pub struct RenderSettings {
    pub resolution_width: i32,
    pub resolution_height: i32,
    pub exposure: f32,
}

impl RenderSettings {
    ///(0, 0) in uv space is the bottom left of the image, so v runs against
    ///the pixel row order.
    fn pixel_to_uv(&self, x: i32, y: i32) -> (f32, f32) {
        ((x as f32 + 0.5) / self.resolution_width as f32,
         ((self.resolution_height - 1 - y) as f32 + 0.5) / self.resolution_height as f32)
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub render_settings: RenderSettings,
    pub scene: SceneSpec,
    #[serde(default)]
    pub integrator: IntegratorSpec,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn render(&self) -> Result<RgbImage, ConfigError> {
        let settings = &self.render_settings;
        let aspect_ratio =
            settings.resolution_width as f32 / settings.resolution_height as f32;
        let scene = self.scene.into_scene(aspect_ratio, &mut ModelCache::new())?;
        let integrator = self.integrator.into_integrator();
        info!("scene bound {:?}", scene.world_bound());

        let render_start = Instant::now();
        let mut buffer = RgbImage::new(i32_to_u32(settings.resolution_width),
                                       i32_to_u32(settings.resolution_height));
        let pixel_info = UvPixelInfo {
            uv_pixel_width: 1.0 / max(settings.resolution_width, 1) as f32,
            uv_pixel_height: 1.0 / max(settings.resolution_height, 1) as f32,
        };

        for block in ImageBlockIterator::new(&buffer, 8, 8) {
            for x in block.start_x()..block.end_x() {
                for y in block.start_y()..block.end_y() {
                    let (u, v) = settings.pixel_to_uv(x as i32, y as i32);
                    let color = self.process_color(
                        integrator.shade_camera_point(&scene, u, v, &pixel_info));
                    buffer.get_pixel_mut(x, y).0 = color.pixel_rgb8_values();
                }
            }
        }
        info!("rendered {}x{} image in {}", buffer.width(), buffer.height(),
              humantime::format_duration(render_start.elapsed()));

        Ok(buffer)
    }

    fn process_color(&self, color: Color3) -> Color3 {
        color * self.render_settings.exposure
    }
}

#[derive(Debug)]
struct ImageBlock {
    block_width: u32,
    block_height: u32,
    pixel_x: u32,
    pixel_y: u32
}

impl ImageBlock {
    fn start_x(&self) -> u32 { self.pixel_x }
    fn start_y(&self) -> u32 { self.pixel_y }
    fn end_x(&self) -> u32 { self.pixel_x + self.block_width }
    fn end_y(&self) -> u32 { self.pixel_y + self.block_height }
}

struct ImageBlockIterator {
    buffer_width: u32,
    buffer_height: u32,
    current_pixel_x: u32,
    current_pixel_y: u32,
    block_width: u32,
    block_height: u32
}

impl ImageBlockIterator {
    fn new(buffer: &RgbImage,
           block_width: u32, block_height: u32) -> ImageBlockIterator {
        ImageBlockIterator {
            buffer_width: buffer.width(),
            buffer_height: buffer.height(),
            current_pixel_x: 0,
            current_pixel_y: 0,
            block_width,
            block_height
        }
    }
}

impl Iterator for ImageBlockIterator {
    type Item = ImageBlock;
    fn next(&mut self) -> Option<Self::Item> {
        if self.current_pixel_y >= self.buffer_height || self.buffer_width == 0 {
            return None;
        }

        //clip the block to the buffer, then advance in row major order
        let block = ImageBlock {
            block_width: (self.buffer_width - self.current_pixel_x).min(self.block_width),
            block_height: (self.buffer_height - self.current_pixel_y).min(self.block_height),
            pixel_x: self.current_pixel_x,
            pixel_y: self.current_pixel_y
        };

        if self.current_pixel_x + self.block_width >= self.buffer_width {
            self.current_pixel_x = 0;
            self.current_pixel_y += self.block_height;
        } else {
            self.current_pixel_x += self.block_width;
        }

        Some(block)
    }
}
