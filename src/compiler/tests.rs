//! End-to-end compilation tests over realistic templates.

use std::cell::RefCell;
use std::rc::Rc;

use crate::compiler::ast::Node;
use crate::compiler::{CompileOptions, CompilerContext, compile};

#[test]
fn compiles_a_realistic_page() {
    let template = r#"
<view class="page">
  <import src="widgets.wxml" />
  <template name="row">
    <text>{{ item.label }}</text>
  </template>
  <view wx:for="{{ items }}" wx:key="id">
    <template is="row" data="{{ item: item }}" />
  </view>
  <view wx:if="{{ count > 0 }}">has {{ count }}</view>
  <view wx:else>empty</view>
</view>
"#;
    let mut ctx = CompilerContext::new();
    let ast = compile(template, &mut ctx, &CompileOptions::default()).expect("compile");

    let root = ast.element(ast.root());
    assert_eq!(root.children.len(), 1);
    let page = ast.element(root.children[0]);
    assert_eq!(page.tag, "view");
    assert_eq!(page.attrs.len(), 1);
    assert_eq!(page.attrs[0].name, "class");

    // import, named template, loop view, conditional view; the else
    // branch folded into the conditional's chain
    assert_eq!(page.children.len(), 4);
    let import = ast.element(page.children[0]);
    assert_eq!(import.import.as_deref(), Some("widgets.wxml"));

    let row = page.children[1];
    assert_eq!(ast.element(row).name.as_deref(), Some("row"));
    assert_eq!(ctx.templates().get("row"), Some(&row));

    let list = ast.element(page.children[2]);
    assert_eq!(list.for_source.as_deref(), Some("{{ items }}"));
    assert_eq!(list.key.as_deref(), Some("id"));
    let caller = ast.element(list.children[0]);
    assert_eq!(caller.component.as_deref(), Some("row"));
    assert_eq!(caller.data.as_deref(), Some("{{ item: item }}"));

    let cond = ast.element(page.children[3]);
    assert_eq!(cond.if_cond.as_deref(), Some("count > 0"));
    assert_eq!(cond.if_conditions.len(), 2);
    assert_eq!(cond.if_conditions[1].exp, None);
    assert_eq!(ast.element(cond.if_conditions[1].block).tag, "view");

    let Node::Text(text) = ast.node(cond.children[0]) else {
        panic!("expected interpolated text inside the conditional");
    };
    assert_eq!(
        text.expression,
        "\"has \"+_s([[7],[3, \"count\"]])"
    );

    assert_eq!(
        ctx.props()[ctx.slot_of("count > 0").unwrap() as usize].as_deref(),
        Some("_s([[2, \">\"], [[7],[3, \"count\"]], [1, 0]])")
    );
    assert!(ctx.slot_of("{{ items }}").is_some());
    assert!(ctx.diagnostics().is_empty());
}

#[test]
fn context_deduplicates_across_templates() {
    let mut ctx = CompilerContext::new();
    let options = CompileOptions::default();
    compile("<view>{{ shared }}</view>", &mut ctx, &options).expect("first");
    let first = ctx.slot_of("{{ shared }}").expect("registered");
    compile("<text a=\"{{ shared }}\">{{ shared }}</text>", &mut ctx, &options).expect("second");
    assert_eq!(ctx.slot_of("{{ shared }}"), Some(first));
    assert_eq!(ctx.props().len(), 1);
}

#[test]
fn diagnostics_forward_once_to_the_sink() {
    let collected: Rc<RefCell<Vec<String>>> = Rc::default();
    let sink = Rc::clone(&collected);
    let options = CompileOptions {
        warn: Some(Box::new(move |message: &str| {
            sink.borrow_mut().push(message.to_string());
        })),
        ..CompileOptions::default()
    };
    let mut ctx = CompilerContext::new();
    compile("<view a=\"1\" a=\"2\"></view>", &mut ctx, &options).expect("first");
    compile("<view a=\"1\" a=\"2\"></view>", &mut ctx, &options).expect("second");
    assert_eq!(collected.borrow().len(), 1);
    assert_eq!(collected.borrow()[0], "duplicate attribute: a");
    assert_eq!(ctx.diagnostics().messages().len(), 1);
}

#[test]
fn namespace_inherits_from_the_parent() {
    let options = CompileOptions {
        get_tag_namespace: Some(Box::new(|tag: &str| {
            (tag == "svg").then(|| "svg".to_string())
        })),
        ..CompileOptions::default()
    };
    let mut ctx = CompilerContext::new();
    let ast = compile("<svg><path/></svg>", &mut ctx, &options).expect("compile");
    let svg = ast.element(ast.element(ast.root()).children[0]);
    assert_eq!(svg.ns.as_deref(), Some("svg"));
    let path = ast.element(svg.children[0]);
    assert_eq!(path.ns.as_deref(), Some("svg"));
}

#[test]
fn fatal_errors_carry_a_readable_message() {
    let mut ctx = CompilerContext::new();
    let err = compile(
        "<view><include/></view>",
        &mut ctx,
        &CompileOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "must have src attribute in include tag");
}
