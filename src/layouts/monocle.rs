use super::{Layout, LayoutCtxt, LayoutKind, Placement};

/// A full-screen stacking layout.
///
/// Every visible window is given the monitor's full usable area; the
/// engine renders whichever one is topmost in focus. Floating windows are
/// left alone, as in the other tiled layouts.
#[derive(Debug, Default, Clone, Copy)]
pub struct Monocle;

impl Layout for Monocle {
    fn symbol(&self) -> &str {
        "[M]"
    }

    fn kind(&self) -> LayoutKind {
        LayoutKind::Tiled
    }

    fn arrange(&self, ctxt: &LayoutCtxt<'_>) -> Vec<Placement> {
        ctxt.tiled()
            .map(|item| Placement {
                id: item.id,
                geom: ctxt.usable,
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

    #[test]
    fn every_window_gets_full_area() {
        let windows = items(5);
        let ctxt = ctxt(&windows);

        let placements = Monocle.arrange(&ctxt);

        assert_eq!(placements.len(), 5);
        assert!(placements.iter().all(|p| p.geom == ctxt.usable));
    }

    #[test]
    fn empty_context_is_empty() {
        let windows = items(0);
        let ctxt = ctxt(&windows);

        assert!(Monocle.arrange(&ctxt).is_empty());
    }
}
