use std::io::Cursor;
use std::time::Duration;

use super::*;
use crate::foundation::core::{ParticleColor, Point, Vec2};
use crate::host::TouchPoint;

fn engine_with_quality(quality: f64) -> MotionEngine {
    let opts = HoverOptions {
        quality,
        ..HoverOptions::default()
    };
    MotionEngine::from_options(&opts, ".").unwrap()
}

fn solid(width: u32, height: u32, rgba: [u8; 4]) -> PixelBuffer {
    let data = rgba
        .iter()
        .copied()
        .cycle()
        .take((width * height * 4) as usize)
        .collect();
    PixelBuffer::from_rgba8(width, height, data).unwrap()
}

fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn wait_for_load(engine: &mut MotionEngine) {
    for _ in 0..500 {
        if engine.poll_load() {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("load did not finish");
}

fn mv(x: f64, y: f64) -> HostEvent {
    HostEvent::PointerMove {
        page_x: x,
        page_y: y,
    }
}

#[test]
fn two_by_two_red_scatters_under_pointer() {
    let mut engine = engine_with_quality(2.0);
    engine
        .attach_surface(DisplayRect::at_origin(2.0, 2.0))
        .unwrap();
    engine.install_image(solid(2, 2, [255, 0, 0, 255])).unwrap();

    let grid = engine.grid();
    assert_eq!((grid.rows(), grid.cols()), (1, 1));
    let p = grid.get(0, 0).unwrap();
    assert_eq!(p.origin(), Point::new(1.0, 1.0));
    assert_eq!(p.color().to_string(), "rgba(255, 0, 0, 1)");
    assert_eq!(engine.scale().ratio, 1.0);

    let now = Instant::now();
    engine.handle_event(&mv(1.0, 1.0), now);
    assert_eq!(
        engine.pointer(),
        PointerState::Present(Point::new(1.0, 1.0))
    );

    let stats = engine.tick().unwrap();
    assert_eq!(stats.repelled, 1);
    let moved = engine.grid().get(0, 0).unwrap().position();
    assert!(moved != Point::new(1.0, 1.0));
    assert!((moved.x - (1.0 - 5.0)).abs() < 1e-12);
    assert_eq!(moved.y, 1.0);
}

#[test]
fn particles_return_to_rest_after_pointer_leaves() {
    let mut engine = engine_with_quality(2.0);
    engine
        .attach_surface(DisplayRect::at_origin(4.0, 4.0))
        .unwrap();
    engine.install_image(solid(4, 4, [0, 0, 255, 255])).unwrap();

    let now = Instant::now();
    engine.handle_event(&mv(2.0, 2.0), now);
    engine.tick().unwrap();
    assert!(engine.grid().particles().iter().any(|p| !p.is_at_rest()));

    engine.handle_event(&HostEvent::PointerLeave, now);
    assert_eq!(engine.pointer(), PointerState::Absent);
    for _ in 0..200 {
        engine.tick().unwrap();
    }
    assert!(engine.grid().particles().iter().all(|p| p.is_at_rest()));
    let stats = engine.tick().unwrap();
    assert_eq!(stats.moved(), 0);
    assert_eq!(stats.resting, engine.grid().len());
}

#[test]
fn resize_rescales_after_quiet_period() {
    let mut engine = engine_with_quality(2.0);
    engine
        .attach_surface(DisplayRect::at_origin(2.0, 2.0))
        .unwrap();
    engine.install_image(solid(2, 2, [255, 0, 0, 255])).unwrap();
    assert_eq!(engine.scale().ratio, 1.0);

    let t0 = Instant::now();
    let half = DisplayRect::at_origin(1.0, 1.0);
    engine.handle_event(&HostEvent::Resize { rect: half }, t0);
    engine.handle_event(
        &HostEvent::Resize { rect: half },
        t0 + Duration::from_millis(100),
    );

    // Second notification restarted the quiet period.
    assert!(!engine.flush_resize(t0 + Duration::from_millis(250)));
    assert_eq!(engine.scale().ratio, 1.0);

    assert!(engine.flush_resize(t0 + Duration::from_millis(300)));
    assert_eq!(engine.scale().ratio, 2.0);
    assert_eq!(engine.display(), Some(half));

    engine.handle_event(&mv(0.5, 0.5), t0);
    assert_eq!(
        engine.pointer(),
        PointerState::Present(Point::new(1.0, 1.0))
    );
}

#[test]
fn tick_and_render_are_noops_until_ready() {
    let mut engine = engine_with_quality(2.0);
    assert!(!engine.is_ready());
    assert_eq!(engine.tick().unwrap(), TickStats::default());
    engine.render();
    assert!(engine.snapshot().is_none());

    engine
        .attach_surface(DisplayRect::at_origin(300.0, 150.0))
        .unwrap();
    assert!(!engine.is_ready());
    assert_eq!(engine.tick().unwrap(), TickStats::default());
    assert_eq!(engine.surface().unwrap().canvas(), DEFAULT_BACKING);
}

#[test]
fn image_before_surface_is_deferred() {
    let mut engine = engine_with_quality(2.0);
    engine.install_image(solid(6, 4, [0, 255, 0, 255])).unwrap();
    assert!(matches!(engine.load_status(), LoadStatus::Deferred));
    assert!(engine.grid().is_empty());

    engine
        .attach_surface(DisplayRect::at_origin(3.0, 2.0))
        .unwrap();
    assert!(matches!(
        engine.load_status(),
        LoadStatus::Ready { particles: 6 }
    ));
    assert_eq!(
        engine.surface().unwrap().canvas(),
        Canvas {
            width: 6,
            height: 4
        }
    );
    assert_eq!(engine.scale().ratio, 2.0);
}

#[test]
fn background_load_installs_on_poll() {
    let mut engine = engine_with_quality(2.0);
    engine
        .attach_surface(DisplayRect::at_origin(4.0, 2.0))
        .unwrap();
    engine.request_load(png_bytes(4, 2, [10, 20, 30, 255]));
    assert!(matches!(engine.load_status(), LoadStatus::Loading { .. }));

    wait_for_load(&mut engine);
    assert!(engine.is_ready());
    assert_eq!(engine.grid().len(), 2);
    assert_eq!(
        engine.grid().get(0, 1).unwrap().color(),
        ParticleColor {
            r: 10.0,
            g: 20.0,
            b: 30.0,
            a: 1.0
        }
    );
}

#[test]
fn failed_load_leaves_blank_state() {
    let mut engine = engine_with_quality(2.0);
    engine
        .attach_surface(DisplayRect::at_origin(2.0, 2.0))
        .unwrap();
    engine.install_image(solid(2, 2, [255, 0, 0, 255])).unwrap();
    engine.render();
    assert!(engine.snapshot().unwrap().data.iter().any(|&b| b != 0));

    engine.request_load(b"not an image".to_vec());
    wait_for_load(&mut engine);
    assert!(matches!(
        engine.load_status(),
        LoadStatus::Failed(ScatterError::Decode(_))
    ));
    assert!(engine.grid().is_empty());
    assert!(!engine.is_ready());
    assert!(engine.snapshot().unwrap().data.iter().all(|&b| b == 0));
}

#[test]
fn blocking_load_returns_error_and_resets() {
    let mut engine = engine_with_quality(2.0);
    engine
        .attach_surface(DisplayRect::at_origin(2.0, 2.0))
        .unwrap();
    engine
        .load_blocking(png_bytes(2, 2, [1, 2, 3, 255]))
        .unwrap();
    assert!(engine.is_ready());

    let err = engine
        .load_blocking("does/not/exist.png")
        .unwrap_err();
    assert!(matches!(err, ScatterError::Load(_)));
    assert!(matches!(engine.load_status(), LoadStatus::Idle));
    assert!(engine.grid().is_empty());
}

#[test]
fn touch_uses_first_contact_and_malformed_events_are_skipped() {
    let mut engine = engine_with_quality(2.0);
    engine
        .attach_surface(DisplayRect {
            left: 10.0,
            top: 20.0,
            width: 300.0,
            height: 150.0,
        })
        .unwrap();
    let now = Instant::now();

    engine.handle_event(
        &HostEvent::TouchMove {
            touches: vec![
                TouchPoint {
                    page_x: 15.0,
                    page_y: 25.0,
                },
                TouchPoint {
                    page_x: 99.0,
                    page_y: 99.0,
                },
            ],
        },
        now,
    );
    assert_eq!(
        engine.pointer(),
        PointerState::Present(Point::new(5.0, 5.0))
    );

    engine.handle_event(&HostEvent::TouchMove { touches: vec![] }, now);
    engine.handle_event(&mv(f64::NAN, 1.0), now);
    engine.handle_event(
        &HostEvent::Resize {
            rect: DisplayRect::at_origin(0.0, 10.0),
        },
        now,
    );
    assert_eq!(
        engine.pointer(),
        PointerState::Present(Point::new(5.0, 5.0))
    );
    assert!(!engine.flush_resize(now + Duration::from_secs(1)));

    engine.handle_event(&HostEvent::TouchEnd, now);
    assert_eq!(engine.pointer(), PointerState::Absent);
}

#[test]
fn reload_swaps_grid_wholesale() {
    let mut engine = engine_with_quality(2.0);
    engine
        .attach_surface(DisplayRect::at_origin(4.0, 4.0))
        .unwrap();
    engine.install_image(solid(4, 4, [255, 0, 0, 255])).unwrap();
    engine.handle_event(&mv(1.0, 1.0), Instant::now());
    engine.tick().unwrap();
    assert!(engine.grid().particles().iter().any(|p| !p.is_at_rest()));

    engine.install_image(solid(8, 2, [0, 0, 255, 128])).unwrap();
    let grid = engine.grid();
    assert_eq!((grid.rows(), grid.cols()), (1, 4));
    assert!(grid.particles().iter().all(|p| p.is_at_rest()));
    assert!(grid.particles().iter().all(|p| p.color().b == 255.0));
    assert_eq!(engine.scale().ratio, 2.0);
}

#[test]
fn detach_resets_everything() {
    let mut engine = engine_with_quality(2.0);
    engine
        .attach_surface(DisplayRect::at_origin(2.0, 2.0))
        .unwrap();
    engine.install_image(solid(2, 2, [255, 0, 0, 255])).unwrap();
    engine.handle_event(&mv(1.0, 1.0), Instant::now());

    engine.detach_surface();
    assert!(engine.surface().is_none());
    assert!(engine.grid().is_empty());
    assert_eq!(engine.pointer(), PointerState::Absent);
    assert_eq!(engine.scale(), ScaleState::default());
    assert!(matches!(engine.load_status(), LoadStatus::Idle));
}

#[test]
fn replacing_surface_stops_loop_and_keeps_image_backing() {
    let mut engine = engine_with_quality(4.0);
    let rect = DisplayRect::at_origin(64.0, 64.0);
    engine.attach_surface(rect).unwrap();
    engine.install_image(solid(64, 64, [0, 128, 0, 255])).unwrap();
    let handle = engine.run();
    assert_eq!(engine.scale().ratio, 1.0);

    engine.attach_surface(rect).unwrap();
    assert!(handle.is_cancelled());
    assert!(!engine.is_running());
    assert_eq!(
        engine.surface().unwrap().canvas(),
        Canvas {
            width: 64,
            height: 64
        }
    );
    assert_eq!(engine.scale().ratio, 1.0);
    assert!(engine.is_ready());

    engine.handle_event(&mv(32.0, 32.0), Instant::now());
    assert_eq!(
        engine.pointer(),
        PointerState::Present(Point::new(32.0, 32.0))
    );

    engine.run();
    assert!(matches!(
        engine.frame(Instant::now()).status,
        crate::motion::frame_loop::FrameStatus::Rendered(_)
    ));
}

#[test]
fn faulted_tick_keeps_last_good_state_and_loop_running() {
    use crate::motion::frame_loop::FrameStatus;

    let mut engine = engine_with_quality(2.0);
    engine
        .attach_surface(DisplayRect::at_origin(4.0, 2.0))
        .unwrap();
    engine.install_image(solid(4, 2, [255, 255, 0, 255])).unwrap();

    let displaced = engine.grid.particles()[1].origin() + Vec2::new(3.0, 0.0);
    engine.grid.particles_mut()[0].set_position(Point::new(f64::NAN, 1.0));
    engine.grid.particles_mut()[1].set_position(displaced);

    engine.run();
    let report = engine.frame(Instant::now());
    assert_eq!(report.status, FrameStatus::Faulted);
    assert_eq!(engine.grid().particles()[1].position(), displaced);
    assert!(engine.is_running());

    let next = engine.frame(Instant::now());
    assert_eq!(next.index, FrameIndex(report.index.0 + 1));
    assert_eq!(next.status, FrameStatus::Faulted);
    assert!(engine.is_running());

    let origin = engine.grid.particles()[0].origin();
    engine.grid.particles_mut()[0].set_position(origin);
    let healed = engine.frame(Instant::now());
    assert!(matches!(healed.status, FrameStatus::Rendered(s) if s.returning == 1));
    assert_ne!(engine.grid().particles()[1].position(), displaced);
}
