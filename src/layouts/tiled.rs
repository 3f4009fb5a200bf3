use tracing::debug;

use super::{Layout, LayoutCtxt, LayoutKind, Placement};

/// A dynamic master-and-stack tiling layout.
///
/// The first `nmaster` visible windows share a master column taking
/// `mfact` of the usable width; the remaining windows stack vertically in
/// the rest. With a single visible window, or `nmaster` covering every
/// window, the full usable area is used. All parameters are monitor-local
/// and come in through the [`LayoutCtxt`].
#[derive(Debug, Default, Clone, Copy)]
pub struct MasterStack;

impl Layout for MasterStack {
    fn symbol(&self) -> &str {
        "[]="
    }

    fn kind(&self) -> LayoutKind {
        LayoutKind::Tiled
    }

    fn arrange(&self, ctxt: &LayoutCtxt<'_>) -> Vec<Placement> {
        let tiled: Vec<_> = ctxt.tiled().collect();
        let usable = ctxt.usable;

        if tiled.is_empty() {
            return Vec::new();
        }

        if tiled.len() == 1 {
            debug!("single window, tiling to full area");
            return vec![Placement {
                id: tiled[0].id,
                geom: usable,
            }];
        }

        let nmaster = (ctxt.nmaster as usize).min(tiled.len());
        let (masters, stack) = tiled.split_at(nmaster);

        // nmaster == 0 collapses the master column entirely; everything
        // covered by nmaster fills the width instead
        let (mcol, scol) = if masters.is_empty() {
            usable.split_columns(0.0)
        } else if stack.is_empty() {
            usable.split_columns(1.0)
        } else {
            usable.split_columns(ctxt.mfact)
        };

        let mut ret = Vec::with_capacity(tiled.len());

        for (item, row) in masters.iter().zip(mcol.split_rows(masters.len())) {
            ret.push(Placement {
                id: item.id,
                geom: row,
            });
        }
        for (item, row) in stack.iter().zip(scol.split_rows(stack.len())) {
            ret.push(Placement {
                id: item.id,
                geom: row,
            });
        }

        ret
    }

    fn boxed(&self) -> Box<dyn Layout> {
        Box::new(*self)
    }
}
