#[cfg(target_family = "wasm")]
use arena_collect::render::{DrawCommand, Frame, Shape};

/// CSS font shorthand for HUD and label text.
pub fn font(size: f32, bold: bool) -> String {
    if bold {
        format!("bold {size}px sans-serif")
    } else {
        format!("{size}px sans-serif")
    }
}

#[cfg(target_family = "wasm")]
fn trace(ctx: &web_sys::CanvasRenderingContext2d, shape: &Shape) {
    ctx.begin_path();
    match shape {
        Shape::Rect {
            x,
            y,
            width,
            height,
        } => ctx.rect(f64::from(*x), f64::from(*y), f64::from(*width), f64::from(*height)),
        Shape::Circle { center, radius } => {
            let _ = ctx.arc(
                f64::from(center.x),
                f64::from(center.y),
                f64::from(*radius),
                0.0,
                std::f64::consts::TAU,
            );
        },
        Shape::Polygon(points) => {
            let mut iter = points.iter();
            if let Some(first) = iter.next() {
                ctx.move_to(f64::from(first.x), f64::from(first.y));
                for p in iter {
                    ctx.line_to(f64::from(p.x), f64::from(p.y));
                }
                ctx.close_path();
            }
        },
    }
}

/// Paint a composed frame onto a 2D context, in command order.
#[cfg(target_family = "wasm")]
pub fn paint(ctx: &web_sys::CanvasRenderingContext2d, frame: &Frame) {
    ctx.clear_rect(0.0, 0.0, f64::from(frame.width), f64::from(frame.height));
    for command in &frame.commands {
        match command {
            DrawCommand::Fill { shape, color } => {
                ctx.set_fill_style_str(&color.to_css());
                trace(ctx, shape);
                ctx.fill();
            },
            DrawCommand::Stroke {
                shape,
                color,
                width,
            } => {
                ctx.set_stroke_style_str(&color.to_css());
                ctx.set_line_width(f64::from(*width));
                trace(ctx, shape);
                ctx.stroke();
            },
            DrawCommand::Line {
                from,
                to,
                color,
                width,
            } => {
                ctx.set_stroke_style_str(&color.to_css());
                ctx.set_line_width(f64::from(*width));
                ctx.begin_path();
                ctx.move_to(f64::from(from.x), f64::from(from.y));
                ctx.line_to(f64::from(to.x), f64::from(to.y));
                ctx.stroke();
            },
            DrawCommand::Text {
                text,
                at,
                size,
                color,
                align,
                bold,
            } => {
                ctx.set_fill_style_str(&color.to_css());
                ctx.set_font(&font(*size, *bold));
                ctx.set_text_align(align.as_str());
                let _ = ctx.fill_text(text, f64::from(at.x), f64::from(at.y));
            },
        }
    }
}
