use crate::config::LipSyncParams;
use crate::rig::ChannelTable;
use smallvec::SmallVec;

/// The two named expression states, usable as a fixed table index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExpressionKind {
    Smile,
    Sad,
}

impl ExpressionKind {
    pub const ALL: [ExpressionKind; 2] = [ExpressionKind::Smile, ExpressionKind::Sad];

    #[inline]
    pub fn slot(self) -> usize {
        match self {
            ExpressionKind::Smile => 0,
            ExpressionKind::Sad => 1,
        }
    }
}

/// Mesh indices for every channel the lip-sync layer manages, resolved
/// once per mesh. Names the mesh does not have resolve to `None` and are
/// skipped everywhere.
#[derive(Clone, Debug, Default)]
pub struct ChannelMap {
    talking: Vec<Option<usize>>,
    expressions: [Option<usize>; 2],
    labels: [String; 2],
}

impl ChannelMap {
    pub fn resolve(params: &LipSyncParams, mesh: &dyn ChannelTable) -> Self {
        let talking: Vec<Option<usize>> = params
            .talking_blendshapes
            .iter()
            .map(|name| mesh.resolve(name))
            .collect();
        let expressions = [
            mesh.resolve(&params.smile_blendshape),
            mesh.resolve(&params.sad_blendshape),
        ];
        let missing = talking.iter().filter(|c| c.is_none()).count()
            + expressions.iter().filter(|c| c.is_none()).count();
        if missing > 0 {
            log::debug!("[lipsync] {missing} configured blendshape(s) not found on mesh");
        }
        Self {
            talking,
            expressions,
            labels: [params.smile_label.clone(), params.sad_label.clone()],
        }
    }

    /// One entry per configured talking blendshape, in configuration order.
    pub fn talking(&self) -> &[Option<usize>] {
        &self.talking
    }

    /// Positions in [`Self::talking`] whose channel resolved.
    pub fn resolved_talking(&self) -> SmallVec<[usize; 8]> {
        self.talking
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.map(|_| i))
            .collect()
    }

    pub fn expression(&self, kind: ExpressionKind) -> Option<usize> {
        self.expressions[kind.slot()]
    }

    /// Match `name` against the expression labels, ignoring case.
    pub fn kind_for(&self, name: &str) -> Option<ExpressionKind> {
        ExpressionKind::ALL
            .into_iter()
            .find(|k| self.labels[k.slot()].eq_ignore_ascii_case(name))
    }

    /// Every resolved channel: talking channels first, then expressions.
    pub fn managed(&self) -> impl Iterator<Item = usize> + '_ {
        self.talking
            .iter()
            .chain(self.expressions.iter())
            .filter_map(|c| *c)
    }
}
