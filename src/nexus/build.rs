//! The two-pass tree walk behind [`Nexus::build`](super::Nexus::build):
//! first collect every export into an empty slot, then fold in every
//! extension, in declaration order, against the now-complete slot table.

use indexmap::IndexMap;

use crate::config::{ConfigItem, ConfigTree, ExtendSpec};
use crate::error::CompositionError;
use crate::sink::CompositionSink;
use crate::tag::TagId;

use super::{duplicate_export, missing_export, Nexus, Slot};

pub(super) fn build<A>(
    tree: &ConfigTree<A>,
    args: &A,
) -> Result<Nexus<A>, Vec<CompositionError>> {
    let sink = CompositionSink::new();
    let mut slots: IndexMap<TagId, Slot> = IndexMap::new();

    walk_exports_tree(tree, args, &mut slots, &sink);
    walk_extends_tree(tree, args, &mut slots, &sink);

    let errors = sink.drain_errors();
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut services = IndexMap::with_capacity(slots.len());
    let mut publishers = Vec::new();
    for (tag, slot) in slots {
        let builder = slot
            .builder
            .expect("slot builder was already consumed before the build step");
        let built = (slot.build)(builder);
        if let Some(publish) = slot.publish {
            publishers.push((tag, publish));
        }
        services.insert(tag, built);
    }

    Ok(Nexus {
        services,
        publishers,
        _args: std::marker::PhantomData,
    })
}

fn walk_exports_tree<A>(
    tree: &ConfigTree<A>,
    args: &A,
    slots: &mut IndexMap<TagId, Slot>,
    sink: &CompositionSink,
) {
    for item in &tree.items {
        walk_exports_item(item, args, slots, sink);
    }
}

fn walk_exports_item<A>(
    item: &ConfigItem<A>,
    args: &A,
    slots: &mut IndexMap<TagId, Slot>,
    sink: &CompositionSink,
) {
    match item {
        ConfigItem::Exports(specs) => {
            for spec in specs {
                if slots.contains_key(&spec.tag) {
                    duplicate_export(spec.tag, sink);
                    continue;
                }
                slots.insert(
                    spec.tag,
                    Slot {
                        builder: Some((spec.make_builder)()),
                        build: spec.build,
                        publish: spec.publish,
                    },
                );
            }
        }
        ConfigItem::Extend(_) => {}
        ConfigItem::Components(trees) => {
            for t in trees {
                walk_exports_tree(t, args, slots, sink);
            }
        }
        ConfigItem::Conditional(cond) => {
            if (cond.predicate)(args) {
                walk_exports_tree(&cond.body, args, slots, sink);
            }
        }
        ConfigItem::Config(items) => {
            for it in items {
                walk_exports_item(it, args, slots, sink);
            }
        }
    }
}

fn walk_extends_tree<A>(
    tree: &ConfigTree<A>,
    args: &A,
    slots: &mut IndexMap<TagId, Slot>,
    sink: &CompositionSink,
) {
    for item in &tree.items {
        walk_extends_item(item, args, slots, sink);
    }
}

fn walk_extends_item<A>(
    item: &ConfigItem<A>,
    args: &A,
    slots: &mut IndexMap<TagId, Slot>,
    sink: &CompositionSink,
) {
    match item {
        ConfigItem::Exports(_) => {}
        ConfigItem::Extend(spec) => apply_extend(spec, slots, sink),
        ConfigItem::Components(trees) => {
            for t in trees {
                walk_extends_tree(t, args, slots, sink);
            }
        }
        ConfigItem::Conditional(cond) => {
            if (cond.predicate)(args) {
                walk_extends_tree(&cond.body, args, slots, sink);
            }
        }
        ConfigItem::Config(items) => {
            for it in items {
                walk_extends_item(it, args, slots, sink);
            }
        }
    }
}

fn apply_extend<A>(spec: &ExtendSpec<A>, slots: &mut IndexMap<TagId, Slot>, sink: &CompositionSink) {
    let target = spec.path[0];
    match slots.get_mut(&target) {
        None => missing_export(target, sink),
        Some(slot) => {
            let builder = slot
                .builder
                .as_mut()
                .expect("slot builder was already consumed before extension");
            (spec.apply)(builder.as_mut());
        }
    }
}
