use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use taxonomy_network::taxonomy::{EntityKind, RelationKind};

pub(super) const OCCUPATION_COLOR: Color32 = Color32::from_rgb(36, 112, 102);
pub(super) const SKILL_COLOR: Color32 = Color32::from_rgb(38, 184, 125);
pub(super) const OUTER_COLOR: Color32 = Color32::from_rgb(156, 163, 175);
pub(super) const ESSENTIAL_EDGE_COLOR: Color32 = Color32::from_rgb(36, 112, 102);
pub(super) const OPTIONAL_EDGE_COLOR: Color32 = Color32::from_rgb(156, 163, 175);

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0) as u8;
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

/// Bounding-box test only.
pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    !(max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom())
}

/// Layout coordinates live in `[0, size]`; the world origin is the layout
/// center so zoom pivots around the pinned center node.
pub(super) fn layout_to_world(layout_size: Vec2, x: f32, y: f32) -> Vec2 {
    Vec2::new(x, y) - (layout_size * 0.5)
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}

pub(super) fn node_radius(distance: u8) -> f32 {
    match distance {
        0 => 12.0,
        1 => 9.0,
        2 => 6.0,
        _ => 4.5,
    }
}

pub(super) fn node_opacity(distance: u8) -> f32 {
    match distance {
        0 | 1 => 1.0,
        2 => 0.7,
        _ => 0.45,
    }
}

pub(super) fn node_color(kind: EntityKind, distance: u8) -> Color32 {
    if distance >= 2 {
        return OUTER_COLOR;
    }
    kind_color(kind)
}

pub(super) fn kind_color(kind: EntityKind) -> Color32 {
    match kind {
        EntityKind::Occupation => OCCUPATION_COLOR,
        EntityKind::Skill => SKILL_COLOR,
    }
}

/// Width and color of an edge whose farther endpoint sits at `max_distance`.
pub(super) fn edge_style(relation: RelationKind, max_distance: u8) -> (f32, Color32) {
    let (width, opacity) = match max_distance {
        0 | 1 => (1.5, 0.6),
        2 => (0.8, 0.15),
        _ => (0.5, 0.08),
    };
    let color = match relation {
        RelationKind::Essential => ESSENTIAL_EDGE_COLOR,
        RelationKind::Optional => OPTIONAL_EDGE_COLOR,
    };
    (width, with_opacity(color, opacity))
}
