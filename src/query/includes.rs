//! Include expansion stage.
//!
//! Resolves the request's `include` names against the resource's declared
//! options, applies any query modifiers, and reports which relation names the
//! post-load step should hydrate. Unknown include names are ignored.

use sea_orm::Select;

use crate::models::FilterParams;
use crate::resource::ListResource;

pub fn apply<R: ListResource>(
    mut select: Select<R::EntityType>,
    params: &FilterParams,
) -> (Select<R::EntityType>, Vec<&'static str>) {
    let mut relations = Vec::new();
    for name in &params.include {
        let Some(option) = R::find_include(name) else {
            tracing::debug!(include = %name, "ignoring unknown include");
            continue;
        };
        if let Some(modifier) = option.modifier {
            select = modifier(select, params);
        }
        for relation in option.relations {
            if !relations.contains(relation) {
                relations.push(relation);
            }
        }
    }
    (select, relations)
}
