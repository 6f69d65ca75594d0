use kube::core::CustomResourceExt;
use oprc_nodeclass::crd::node_class::NodeClass;

fn main() -> anyhow::Result<()> {
    let crd = NodeClass::crd();
    println!("{}", serde_yaml::to_string(&crd)?);
    Ok(())
}
