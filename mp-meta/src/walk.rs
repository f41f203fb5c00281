//! Depth-first traversal of meta trees

use crate::meta::Meta;

/// Callbacks for [`walk`]. Every method defaults to doing nothing.
pub trait Visitor {
    fn begin_meta(&mut self, m: &Meta, kind: &str, method: &str, ns: &str, gid: &str) {
        let _ = (m, kind, method, ns, gid);
    }

    fn on_tag(&mut self, m: &Meta, name: &str, value: &str) {
        let _ = (m, name, value);
    }

    fn on_sub(&mut self, m: &Meta, name: &str, sub: &Meta) {
        let _ = (m, name, sub);
    }

    fn on_rel(&mut self, m: &Meta, name: &str, rel: &Meta) {
        let _ = (m, name, rel);
    }

    fn on_list_item(&mut self, m: &Meta, index: usize, item: &Meta) {
        let _ = (m, index, item);
    }

    fn end_meta(&mut self, m: &Meta) {
        let _ = m;
    }
}

/// Visits `m` depth-first.
///
/// Order: the node itself, its tags, then each sub (announced, then
/// walked), each relation (same), each list item (same), and finally the
/// end of the node. Attributes and payload are not visited.
pub fn walk<V: Visitor + ?Sized>(m: &Meta, v: &mut V) {
    v.begin_meta(m, m.kind(), m.method(), m.ns(), m.gid());
    for (name, value) in m.info().tags() {
        v.on_tag(m, name, value);
    }
    for (name, sub) in m.subs_map() {
        v.on_sub(m, name, sub);
        walk(sub, v);
    }
    for (name, rel) in m.rels_map() {
        v.on_rel(m, name, rel);
        walk(rel, v);
    }
    for (index, item) in m.list().iter().enumerate() {
        v.on_list_item(m, index, item);
        walk(item, v);
    }
    v.end_meta(m);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Trace(Vec<String>);

    impl Visitor for Trace {
        fn begin_meta(&mut self, _m: &Meta, kind: &str, _method: &str, _ns: &str, _gid: &str) {
            self.0.push(format!("begin {kind}"));
        }

        fn on_tag(&mut self, _m: &Meta, name: &str, value: &str) {
            self.0.push(format!("tag {name}={value}"));
        }

        fn on_sub(&mut self, _m: &Meta, name: &str, _sub: &Meta) {
            self.0.push(format!("sub {name}"));
        }

        fn on_rel(&mut self, _m: &Meta, name: &str, _rel: &Meta) {
            self.0.push(format!("rel {name}"));
        }

        fn on_list_item(&mut self, _m: &Meta, index: usize, _item: &Meta) {
            self.0.push(format!("item {index}"));
        }

        fn end_meta(&mut self, m: &Meta) {
            self.0.push(format!("end {}", m.kind()));
        }
    }

    #[test]
    fn test_walk_order() {
        let m = Meta::new("Order")
            .with_tag("status", "open")
            .with_attr("ignored", "yes")
            .with_list([Meta::new("Line"), Meta::new("Line2")])
            .with_rel("owner", Meta::new("User"))
            .with_sub("customer", Meta::new("Customer").with_tag("vip", "1"));

        let mut trace = Trace::default();
        m.walk(&mut trace);

        assert_eq!(
            trace.0,
            vec![
                "begin Order",
                "tag status=open",
                "sub customer",
                "begin Customer",
                "tag vip=1",
                "end Customer",
                "rel owner",
                "begin User",
                "end User",
                "item 0",
                "begin Line",
                "end Line",
                "item 1",
                "begin Line2",
                "end Line2",
                "end Order",
            ]
        );
    }

    #[test]
    fn test_default_visitor_is_silent() {
        struct Nothing;
        impl Visitor for Nothing {}
        walk(&Meta::new("X").with_sub("a", Meta::new("A")), &mut Nothing);
    }
}
