//! Physical-naming policies.
//!
//! Every provider resource type a component may create has an explicit
//! naming decision. The table below is the single place those decisions
//! live: adding a resource type means adding an entry here. Types missing
//! from the table are rejected by the component guard.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::registry::is_component_type;

/// How a computed physical name is post-processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameStyle {
    /// Use the name as computed
    Preserve,
    /// Lower-case the whole name
    Lowercase,
    /// Replace dashes with underscores
    Underscore,
}

impl NameStyle {
    /// Apply the style to a computed name.
    pub fn apply(self, name: String) -> String {
        match self {
            NameStyle::Preserve => name,
            NameStyle::Lowercase => name.to_lowercase(),
            NameStyle::Underscore => name.replace('-', "_"),
        }
    }
}

/// Suffix appended after the prefixed name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixRule {
    /// No suffix
    None,
    /// `suffix` when the boolean property `flag_field` is true
    FifoFlag {
        /// Property holding the flag
        flag_field: &'static str,
        /// Suffix used when the flag is set
        suffix: &'static str,
    },
    /// `-{region}` with the region lower-cased and its dashes removed
    Region,
}

/// The naming decision for one resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingPolicy {
    /// Write a physical name into `field` unless the caller set one
    Field {
        /// Property receiving the name
        field: &'static str,
        /// Provider limit for the name
        max_length: usize,
        /// Post-processing of the computed name
        style: NameStyle,
        /// Suffix rule
        suffix: SuffixRule,
    },
    /// Write a physical name into the `Name` tag
    Tag {
        /// Provider limit for the tag value
        max_length: usize,
    },
    /// The creating component names the resource itself
    Manual,
    /// The provider does not require a unique name for this type
    Unprefixed,
    /// Framework components, dynamic providers and generator helpers
    Internal,
}

impl NamingPolicy {
    /// Whether the policy writes a name into the props.
    pub fn assigns_name(&self) -> bool {
        matches!(self, NamingPolicy::Field { .. } | NamingPolicy::Tag { .. })
    }
}

/// Property the `Tag` policy writes into.
pub const TAGS_FIELD: &str = "tags";

/// Tag key the `Tag` policy sets.
pub const NAME_TAG: &str = "Name";

const fn field(field: &'static str, max_length: usize, style: NameStyle) -> NamingPolicy {
    NamingPolicy::Field {
        field,
        max_length,
        style,
        suffix: SuffixRule::None,
    }
}

const INTERNAL_TYPES: &[&str] = &[
    "pulumi-nodejs:dynamic:Resource",
    "random:index/randomId:RandomId",
    "random:index/randomPassword:RandomPassword",
    "tls:index/privateKey:PrivateKey",
];

const MANUAL_TYPES: &[&str] = &[
    "aws:appsync/dataSource:DataSource",
    "aws:appsync/function:Function",
    "aws:appsync/resolver:Resolver",
    "aws:cloudwatch/eventBus:EventBus",
    "aws:cognito/identityPool:IdentityPool",
    "aws:ecs/service:Service",
    "aws:ecs/taskDefinition:TaskDefinition",
    "aws:lb/targetGroup:TargetGroup",
    "aws:s3/bucketV2:BucketV2",
    "aws:servicediscovery/privateDnsNamespace:PrivateDnsNamespace",
    "aws:servicediscovery/service:Service",
];

const UNPREFIXED_TYPES: &[&str] = &[
    "aws:acm/certificate:Certificate",
    "aws:acm/certificateValidation:CertificateValidation",
    "aws:apigateway/basePathMapping:BasePathMapping",
    "aws:apigateway/deployment:Deployment",
    "aws:apigateway/domainName:DomainName",
    "aws:apigateway/integration:Integration",
    "aws:apigateway/integrationResponse:IntegrationResponse",
    "aws:apigateway/method:Method",
    "aws:apigateway/methodResponse:MethodResponse",
    "aws:apigateway/resource:Resource",
    "aws:apigateway/response:Response",
    "aws:apigateway/stage:Stage",
    "aws:apigatewayv2/apiMapping:ApiMapping",
    "aws:apigatewayv2/domainName:DomainName",
    "aws:apigatewayv2/integration:Integration",
    "aws:apigatewayv2/route:Route",
    "aws:apigatewayv2/stage:Stage",
    "aws:appautoscaling/target:Target",
    "aws:appsync/domainName:DomainName",
    "aws:appsync/domainNameApiAssociation:DomainNameApiAssociation",
    "aws:ec2/routeTableAssociation:RouteTableAssociation",
    "aws:iam/accessKey:AccessKey",
    "aws:iam/instanceProfile:InstanceProfile",
    "aws:iam/policy:Policy",
    "aws:iam/userPolicy:UserPolicy",
    "aws:cloudfront/cachePolicy:CachePolicy",
    "aws:cloudfront/distribution:Distribution",
    "aws:cloudwatch/eventRule:EventRule",
    "aws:cloudwatch/eventTarget:EventTarget",
    "aws:cloudwatch/logGroup:LogGroup",
    "aws:cognito/identityPoolRoleAttachment:IdentityPoolRoleAttachment",
    "aws:cognito/identityProvider:IdentityProvider",
    "aws:cognito/userPoolClient:UserPoolClient",
    "aws:elasticache/replicationGroup:ReplicationGroup",
    "aws:lambda/eventSourceMapping:EventSourceMapping",
    "aws:lambda/functionUrl:FunctionUrl",
    "aws:lambda/invocation:Invocation",
    "aws:lambda/permission:Permission",
    "aws:lambda/provisionedConcurrencyConfig:ProvisionedConcurrencyConfig",
    "aws:lb/listener:Listener",
    "aws:rds/proxyDefaultTargetGroup:ProxyDefaultTargetGroup",
    "aws:rds/proxyTarget:ProxyTarget",
    "aws:route53/record:Record",
    "aws:s3/bucketCorsConfigurationV2:BucketCorsConfigurationV2",
    "aws:s3/bucketNotification:BucketNotification",
    "aws:s3/bucketObject:BucketObject",
    "aws:s3/bucketObjectv2:BucketObjectv2",
    "aws:s3/bucketPolicy:BucketPolicy",
    "aws:s3/bucketPublicAccessBlock:BucketPublicAccessBlock",
    "aws:s3/bucketVersioningV2:BucketVersioningV2",
    "aws:s3/bucketWebsiteConfigurationV2:BucketWebsiteConfigurationV2",
    "aws:secretsmanager/secretVersion:SecretVersion",
    "aws:ses/domainIdentityVerification:DomainIdentityVerification",
    "aws:sesv2/emailIdentity:EmailIdentity",
    "aws:sns/topicSubscription:TopicSubscription",
    "cloudflare:index/record:Record",
    "cloudflare:index/workerDomain:WorkerDomain",
    "cloudflare:index/workerCronTrigger:WorkerCronTrigger",
    "docker-build:index:Image",
    "vercel:index/dnsRecord:DnsRecord",
];

/// Types whose name is written into a field or tag, grouped by rule.
const FIELD_RULES: &[(&[&str], NamingPolicy)] = &[
    // Load balancers allow 32 characters but the provider appends an
    // 8 character suffix.
    (&["aws:lb/loadBalancer:LoadBalancer"], field("name", 24, NameStyle::Preserve)),
    (&["aws:rds/proxy:Proxy"], field("name", 60, NameStyle::Lowercase)),
    (&["aws:rds/cluster:Cluster"], field("clusterIdentifier", 63, NameStyle::Lowercase)),
    (
        &["aws:rds/clusterInstance:ClusterInstance", "aws:rds/instance:Instance"],
        field("identifier", 63, NameStyle::Lowercase),
    ),
    (
        &[
            "aws:cloudwatch/eventRule:EventRule",
            "aws:cloudfront/function:Function",
            "aws:iam/user:User",
            "aws:lambda/function:Function",
        ],
        field("name", 64, NameStyle::Preserve),
    ),
    (
        &["aws:sqs/queue:Queue"],
        NamingPolicy::Field {
            field: "name",
            max_length: 80,
            style: NameStyle::Preserve,
            suffix: SuffixRule::FifoFlag {
                flag_field: "fifoQueue",
                suffix: ".fifo",
            },
        },
    ),
    (
        &["aws:iam/role:Role"],
        NamingPolicy::Field {
            field: "name",
            max_length: 64,
            style: NameStyle::Preserve,
            suffix: SuffixRule::Region,
        },
    ),
    (
        &[
            "aws:apigateway/authorizer:Authorizer",
            "aws:apigateway/restApi:RestApi",
            "aws:apigatewayv2/api:Api",
            "aws:apigatewayv2/authorizer:Authorizer",
            "aws:apigatewayv2/vpcLink:VpcLink",
            "aws:cognito/userPool:UserPool",
            "aws:iot/authorizer:Authorizer",
        ],
        field("name", 128, NameStyle::Preserve),
    ),
    (&["aws:iot/topicRule:TopicRule"], field("name", 128, NameStyle::Underscore)),
    (
        &[
            "aws:appautoscaling/policy:Policy",
            "aws:dynamodb/table:Table",
            "aws:kinesis/stream:Stream",
            "aws:ecs/cluster:Cluster",
        ],
        field("name", 255, NameStyle::Preserve),
    ),
    (
        &[
            "aws:elasticache/subnetGroup:SubnetGroup",
            "aws:rds/parameterGroup:ParameterGroup",
            "aws:rds/subnetGroup:SubnetGroup",
        ],
        field("name", 255, NameStyle::Lowercase),
    ),
    (&["aws:ec2/keyPair:KeyPair"], field("keyName", 255, NameStyle::Preserve)),
    (
        &[
            "aws:ec2/eip:Eip",
            "aws:ec2/instance:Instance",
            "aws:ec2/internetGateway:InternetGateway",
            "aws:ec2/natGateway:NatGateway",
            "aws:ec2/routeTable:RouteTable",
            "aws:ec2/securityGroup:SecurityGroup",
            "aws:ec2/defaultSecurityGroup:DefaultSecurityGroup",
            "aws:ec2/subnet:Subnet",
            "aws:ec2/vpc:Vpc",
        ],
        NamingPolicy::Tag { max_length: 255 },
    ),
    (
        &["aws:sns/topic:Topic"],
        NamingPolicy::Field {
            field: "name",
            max_length: 256,
            style: NameStyle::Preserve,
            suffix: SuffixRule::FifoFlag {
                flag_field: "fifoTopic",
                suffix: ".fifo",
            },
        },
    ),
    (&["aws:secretsmanager/secret:Secret"], field("name", 512, NameStyle::Preserve)),
    (&["aws:appsync/graphQLApi:GraphQLApi"], field("name", 65536, NameStyle::Preserve)),
    (
        &[
            "cloudflare:index/d1Database:D1Database",
            "cloudflare:index/r2Bucket:R2Bucket",
            "cloudflare:index/workerScript:WorkerScript",
            "cloudflare:index/queue:Queue",
        ],
        field("name", 64, NameStyle::Lowercase),
    ),
    (
        &["cloudflare:index/workersKvNamespace:WorkersKvNamespace"],
        field("title", 64, NameStyle::Lowercase),
    ),
];

static NAMING_POLICIES: Lazy<HashMap<&'static str, NamingPolicy>> = Lazy::new(|| {
    let mut table = HashMap::new();
    // Field rules first: an unprefixed entry for the same type wins.
    for (types, policy) in FIELD_RULES {
        for type_tag in *types {
            table.insert(*type_tag, *policy);
        }
    }
    for type_tag in UNPREFIXED_TYPES {
        table.insert(*type_tag, NamingPolicy::Unprefixed);
    }
    for type_tag in MANUAL_TYPES {
        table.insert(*type_tag, NamingPolicy::Manual);
    }
    for type_tag in INTERNAL_TYPES {
        table.insert(*type_tag, NamingPolicy::Internal);
    }
    table
});

static INTERNAL: NamingPolicy = NamingPolicy::Internal;

/// Look up the naming policy of a resource type.
///
/// Framework components are always internal. `None` means the type has no
/// naming decision and must be rejected.
pub fn naming_policy(type_tag: &str) -> Option<&'static NamingPolicy> {
    if is_component_type(type_tag) {
        return Some(&INTERNAL);
    }
    NAMING_POLICIES.get(type_tag)
}
