use super::{Layout, LayoutCtxt, LayoutKind, Placement};

/// How many pixels of a window must stay reachable on-screen.
const MIN_ONSCREEN: u32 = 32;

/// The null layout.
///
/// Windows keep whatever geometry they asked for; the only enforcement is
/// a clamp that keeps at least a corner of each window on-screen so it
/// can still be grabbed.
#[derive(Debug, Default, Clone, Copy)]
pub struct Floating;

impl Layout for Floating {
    fn symbol(&self) -> &str {
        "><>"
    }

    fn kind(&self) -> LayoutKind {
        LayoutKind::Floating
    }

    fn arrange(&self, ctxt: &LayoutCtxt<'_>) -> Vec<Placement> {
        ctxt.windows
            .iter()
            .map(|item| Placement {
                id: item.id,
                geom: item.geom.clamp_within(&ctxt.usable, MIN_ONSCREEN),
            })
            .collect()
    }

    fn boxed(&self) -> Box<dyn Layout> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layouts::testutil::{ctxt, items};
    use crate::types::Rect;

    #[test]
    fn onscreen_windows_are_untouched() {
        let windows = items(3);
        let ctxt = ctxt(&windows);

        let placements = Floating.arrange(&ctxt);

        for (p, w) in placements.iter().zip(&windows) {
            assert_eq!(p.geom, w.geom);
        }
    }

    #[test]
    fn offscreen_windows_are_pulled_back() {
        let mut windows = items(1);
        windows[0].geom = Rect::new(5000, -4000, 300, 200);
        let ctxt = ctxt(&windows);

        let placements = Floating.arrange(&ctxt);
        let geom = placements[0].geom;

        // at least MIN_ONSCREEN pixels overlap the usable area
        assert!(geom.x < ctxt.usable.x + ctxt.usable.width as i32);
        assert!(geom.x + geom.width as i32 > ctxt.usable.x);
        assert!(geom.y + geom.height as i32 > ctxt.usable.y);
        assert_eq!(geom.width, 300);
        assert_eq!(geom.height, 200);
    }
}
